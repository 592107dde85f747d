//! Episode listing and lookup.
//!
//! Every request reads the sheet afresh; nothing is cached between requests.

use axum::extract::State;
use axum::Json;
use podscript_core::episode::Episode;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::extract::ValidatedQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Default number of upcoming episodes returned.
const DEFAULT_UPCOMING_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct UpcomingQuery {
    #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 200, message = "topic must be 1 to 200 characters"))]
    pub topic: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /episodes
pub async fn list_all(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Episode>>>> {
    let episodes = state.scripts.all_episodes().await?;
    Ok(Json(ApiResponse::ok(episodes)))
}

/// GET /episodes/matching
///
/// 404 when neither the strict nor the relaxed filter matches any row.
pub async fn list_matching(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Episode>>>> {
    let episodes = state.scripts.relevant_episodes().await?;
    Ok(Json(ApiResponse::ok(episodes)))
}

/// GET /episodes/upcoming?limit=
pub async fn list_upcoming(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<UpcomingQuery>,
) -> AppResult<Json<ApiResponse<Vec<Episode>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);
    let episodes = state.scripts.upcoming_episodes(limit).await?;
    Ok(Json(ApiResponse::ok(episodes)))
}

/// GET /episodes/search?topic=
pub async fn search_by_topic(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> AppResult<Json<ApiResponse<Episode>>> {
    let episode = state.scripts.find_episode(&query.topic).await?;
    Ok(Json(ApiResponse::ok(episode)))
}
