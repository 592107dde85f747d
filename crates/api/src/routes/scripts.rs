use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::scripts;
use crate::state::AppState;

/// Routes mounted at `/scripts`.
///
/// ```text
/// POST /generate   -> generate_script
/// ```
///
/// `POST /batch` is mounted separately by [`batch_route`] so it can run under
/// its own timeout.
pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(scripts::generate_script))
}

/// `POST /api/v1/scripts/batch` wrapped in a timeout of `timeout`.
pub fn batch_route(timeout: Duration) -> Router<AppState> {
    Router::new().route(
        "/api/v1/scripts/batch",
        post(scripts::generate_batch)
            .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)),
    )
}
