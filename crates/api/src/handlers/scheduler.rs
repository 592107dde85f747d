//! Scheduler control endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::background::scheduler::{RunTrigger, SchedulerStatus};
use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Result of a start or stop request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    /// `false` when the scheduler was already in the requested state.
    pub changed: bool,
    pub status: SchedulerStatus,
}

/// Result of a run-now request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequested {
    /// `false` when the run was dropped by the re-entrancy guard.
    pub triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}

/// GET /scheduler
pub async fn get_status(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SchedulerStatus>>> {
    Ok(Json(ApiResponse::ok(state.scheduler.status().await)))
}

/// POST /scheduler/start
pub async fn start(State(state): State<AppState>) -> AppResult<Json<ApiResponse<StateChange>>> {
    let changed = state.scheduler.start().await;
    let status = state.scheduler.status().await;
    Ok(Json(ApiResponse::ok(StateChange { changed, status })))
}

/// POST /scheduler/stop
///
/// A run already in progress is allowed to finish.
pub async fn stop(State(state): State<AppState>) -> AppResult<Json<ApiResponse<StateChange>>> {
    let changed = state.scheduler.stop().await;
    let status = state.scheduler.status().await;
    Ok(Json(ApiResponse::ok(StateChange { changed, status })))
}

/// POST /scheduler/run
///
/// Admits a run through the re-entrancy guard and executes it in the
/// background; poll `GET /scheduler` for its summary. Responds 202 when the
/// run was started and 200 with `triggered: false` when it was dropped.
pub async fn run_now(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<ApiResponse<RunRequested>>)> {
    let Some(ticket) = state.scheduler.begin_run(RunTrigger::Manual).await else {
        return Ok((
            StatusCode::OK,
            Json(ApiResponse::ok(RunRequested {
                triggered: false,
                run_id: None,
            })),
        ));
    };

    let run_id = ticket.run_id;
    let scheduler = Arc::clone(&state.scheduler);
    tokio::spawn(async move {
        scheduler.complete_run(ticket).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(RunRequested {
            triggered: true,
            run_id: Some(run_id),
        })),
    ))
}
