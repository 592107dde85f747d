//! Liveness endpoint, mounted at the root rather than under `/api/v1`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Generation model requests are sent to.
    pub model: String,
    pub scheduler_running: bool,
}

/// Answers from local state only; neither the spreadsheet nor the model is
/// contacted.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: state.config.llm.model.clone(),
        scheduler_running: state.scheduler.is_running().await,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
