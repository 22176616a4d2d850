//! The LLM judge: a trait the orchestrator depends on, and the client that
//! implements it by composing prompt building, a single-attempt transport, a
//! per-attempt timeout, reply parsing and the retry policy.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::JudgeSettings;
use crate::domain::RawScores;
use crate::prompt::build_prompt_in;

pub mod openai;
pub mod parse;
pub mod retry;

pub use parse::parse_judge_reply;
pub use retry::RetryPolicy;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum JudgeError {
  #[error("judge is not configured (OPENAI_API_KEY missing)")]
  NotConfigured,
  #[error("judge network error: {0}")]
  Network(String),
  #[error("judge HTTP {status}: {message}")]
  Http { status: u16, message: String },
  #[error("judge timed out after {after:?}")]
  Timeout { after: Duration },
  #[error("judge reply could not be parsed: {0}")]
  Parse(String),
}

impl JudgeError {
  pub fn is_timeout(&self) -> bool { matches!(self, JudgeError::Timeout { .. }) }

  /// Parse failures share the transient budget; only a missing key is final.
  pub fn is_retryable(&self) -> bool { !matches!(self, JudgeError::NotConfigured) }
}

/// Anything that can score an essay.
#[async_trait]
pub trait Judge: Send + Sync {
  async fn score(
    &self,
    topic: Option<&str>,
    essay: &str,
    min_words: u32,
    max_words: u32,
  ) -> Result<RawScores, JudgeError>;
}

/// One round trip to the LLM: prompt in, raw reply text out. No retries here.
#[async_trait]
pub trait JudgeTransport: Send + Sync {
  async fn complete(&self, prompt: &str) -> Result<String, JudgeError>;
}

/// Judge backed by a transport, with timeout and retry around each attempt.
pub struct JudgeClient<T> {
  transport: T,
  retry: RetryPolicy,
  attempt_timeout: Duration,
  feedback_language: String,
}

impl<T: JudgeTransport> JudgeClient<T> {
  pub fn new(transport: T, settings: &JudgeSettings) -> Self {
    Self {
      transport,
      retry: settings.retry_policy(),
      attempt_timeout: settings.attempt_timeout(),
      feedback_language: settings.feedback_language.clone(),
    }
  }

  pub fn with_policy(transport: T, retry: RetryPolicy, attempt_timeout: Duration) -> Self {
    Self {
      transport,
      retry,
      attempt_timeout,
      feedback_language: crate::prompt::DEFAULT_FEEDBACK_LANGUAGE.to_string(),
    }
  }

  async fn attempt(&self, prompt: &str) -> Result<RawScores, JudgeError> {
    let reply = tokio::time::timeout(self.attempt_timeout, self.transport.complete(prompt))
      .await
      .map_err(|_| JudgeError::Timeout { after: self.attempt_timeout })??;
    parse_judge_reply(&reply)
  }
}

#[async_trait]
impl<T: JudgeTransport> Judge for JudgeClient<T> {
  #[instrument(level = "info", target = "scoring", skip(self, topic, essay), fields(essay_len = essay.len()))]
  async fn score(
    &self,
    topic: Option<&str>,
    essay: &str,
    min_words: u32,
    max_words: u32,
  ) -> Result<RawScores, JudgeError> {
    let prompt = build_prompt_in(topic, essay, min_words, max_words, &self.feedback_language);
    let start = std::time::Instant::now();
    let raw = self
      .retry
      .run(|_attempt| self.attempt(&prompt), JudgeError::is_retryable)
      .await?;
    info!(target: "scoring", elapsed_ms = start.elapsed().as_millis() as u64, feedback_len = raw.feedback.len(), "Judge scores received");
    Ok(raw)
  }
}

/// Stand-in used when no API key is configured: every call fails fast.
pub struct UnavailableJudge;

#[async_trait]
impl Judge for UnavailableJudge {
  async fn score(&self, _: Option<&str>, _: &str, _: u32, _: u32) -> Result<RawScores, JudgeError> {
    Err(JudgeError::NotConfigured)
  }
}
