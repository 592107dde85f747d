use axum::routing::{get, post};
use axum::Router;

use crate::handlers::scheduler;
use crate::state::AppState;

/// Routes mounted at `/scheduler`.
///
/// ```text
/// GET  /         -> get_status
/// POST /start    -> start
/// POST /stop     -> stop
/// POST /run      -> run_now
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scheduler::get_status))
        .route("/start", post(scheduler::start))
        .route("/stop", post(scheduler::stop))
        .route("/run", post(scheduler::run_now))
}
