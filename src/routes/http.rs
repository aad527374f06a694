//! HTTP endpoint handlers. All read-only; practice itself runs over the WebSocket.
//! Each handler is instrumented and logs basic result info.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::seeds::{CONCEPTS, MODE_CATALOG};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, model_configured: state.content.is_some() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_score(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let summary = state.score.lock().await.summary();
  info!(target: "score", points = summary.points, level = summary.level.level, "HTTP score served");
  Json(summary)
}

#[instrument(level = "info")]
pub async fn http_get_modes() -> impl IntoResponse {
  Json(MODE_CATALOG.iter().map(ModeOut::from).collect::<Vec<_>>())
}

#[instrument(level = "info")]
pub async fn http_get_concepts() -> impl IntoResponse {
  Json(CONCEPTS.iter().map(ConceptOut::from).collect::<Vec<_>>())
}
