//! Writing Quest · essay scoring backend
//!
//! - Axum HTTP API
//! - LLM judge via OpenAI chat completions (enabled by environment variables)
//!
//! Important env variables:
//!   PORT            : u16 (default 3000)
//!   OPENAI_API_KEY  : enables the judge if present
//!   OPENAI_BASE_URL : default "https://api.openai.com/v1"
//!   OPENAI_MODEL    : overrides `[judge].model` (default "gpt-4-turbo")
//!   APP_CONFIG_PATH : path to TOML config (judge tuning, scoring, quests, users)
//!   LOG_LEVEL       : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use writing_quest_backend::routes::build_router;
use writing_quest_backend::state::AppState;
use writing_quest_backend::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: store, orchestrator, judge.
  let state = Arc::new(AppState::from_env().await);

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "writing_quest", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "writing_quest", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "writing_quest", "Shutdown signal received");
}
