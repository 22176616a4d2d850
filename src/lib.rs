//! Writing Quest backend: daily writing quests scored by an LLM judge.

pub mod config;
pub mod domain;
pub mod error;
pub mod judge;
pub mod orchestrator;
pub mod prompt;
pub mod protocol;
pub mod quest;
pub mod routes;
pub mod scoring;
pub mod seeds;
pub mod state;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod util;
pub mod wordcount;
