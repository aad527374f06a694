//! Subjuntivo · Spanish subjunctive practice backend
//!
//! - Axum HTTP + WebSocket API (six practice modes, server-side session state)
//! - Content from an OpenAI-compatible model (via environment variables)
//! - Persistent score with levels
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   OPENAI_API_KEY      : enables content generation; without it every round fails to load
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL   : default "gpt-4o-mini" (roleplay turns)
//!   OPENAI_STRONG_MODEL : default "gpt-4o" (challenges and sentence judgments)
//!   OPENAI_TIMEOUT_SECS : optional per-call transport timeout (default: none)
//!   AGENT_CONFIG_PATH   : path to TOML config (prompts + storage)
//!   SCORE_DIR           : where the score file lives (default: platform data dir)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod markup;
mod evaluate;
mod scoring;
mod puzzle;
mod content;
mod session;
mod practice;
mod state;
mod protocol;
mod openai;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: content source and the score board.
  let state = Arc::new(AppState::new());
  {
    let summary = state.score.lock().await.summary();
    info!(target: "subjuntivo_backend", points = summary.points, level = summary.level.level, title = summary.level.title, "Starting score");
  }

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "subjuntivo_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "subjuntivo_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "subjuntivo_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "subjuntivo_backend", "Shutdown requested");
}
