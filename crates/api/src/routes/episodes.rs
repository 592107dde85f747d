use axum::routing::get;
use axum::Router;

use crate::handlers::episodes;
use crate::state::AppState;

/// Routes mounted at `/episodes`.
///
/// ```text
/// GET /            -> list_all
/// GET /matching    -> list_matching
/// GET /upcoming    -> list_upcoming
/// GET /search      -> search_by_topic
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(episodes::list_all))
        .route("/matching", get(episodes::list_matching))
        .route("/upcoming", get(episodes::list_upcoming))
        .route("/search", get(episodes::search_by_topic))
}
