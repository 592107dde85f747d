//! Script generation endpoints.
//!
//! Requests are validated in full before any spreadsheet or model call.

use std::borrow::Cow;

use axum::extract::State;
use axum::Json;
use podscript_core::templates::EpisodeType;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::engine::scripts::{BatchItem, BatchReport, GenerationOutcome};
use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /scripts/generate`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScriptRequest {
    #[validate(custom(function = "non_blank_topic"))]
    pub topic: String,
    #[validate(custom(function = "known_episode_type"))]
    pub episode_type: String,
    /// Also generate title, tags and description.
    #[serde(default)]
    pub include_seo: bool,
    /// Write `Generated` to the episode's status cell afterwards.
    #[serde(default)]
    pub mark_processed: bool,
}

/// One entry of a batch. `Serialize` lets the `length` check on
/// [`BatchRequest::items`] record the rejected list.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemRequest {
    #[validate(custom(function = "non_blank_topic"))]
    pub topic: String,
    #[validate(custom(function = "known_episode_type"))]
    pub episode_type: String,
}

/// Body of `POST /scripts/batch`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[validate(
        length(min = 1, max = 5, message = "items must contain between 1 and 5 entries"),
        nested
    )]
    pub items: Vec<BatchItemRequest>,
    #[serde(default)]
    pub include_seo: bool,
}

fn non_blank_topic(topic: &str) -> Result<(), ValidationError> {
    let len = topic.trim().chars().count();
    if len == 0 || len > 200 {
        return Err(ValidationError::new("topic")
            .with_message(Cow::Borrowed("topic must be 1 to 200 non-blank characters")));
    }
    Ok(())
}

fn known_episode_type(value: &str) -> Result<(), ValidationError> {
    match value.parse::<EpisodeType>() {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new("episode_type")
            .with_message(Cow::Borrowed("episodeType must be one of: main, friday"))),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /scripts/generate
///
/// Find the first relevant episode matching `topic`, generate its script and
/// optionally SEO metadata. With `markProcessed`, the status cell is set to
/// `Generated`; a failed write-back is logged and reported as
/// `markedProcessed: false` rather than discarding the script.
pub async fn generate_script(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<GenerateScriptRequest>,
) -> AppResult<Json<ApiResponse<GenerationOutcome>>> {
    let episode_type: EpisodeType = input.episode_type.parse()?;

    let outcome = state
        .scripts
        .generate_for_topic(
            &input.topic,
            episode_type,
            input.include_seo,
            input.mark_processed,
        )
        .await?;

    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /scripts/batch
///
/// Generate up to five scripts in order. Individual failures are collected
/// in `errors` and do not fail the request.
pub async fn generate_batch(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<BatchRequest>,
) -> AppResult<Json<ApiResponse<BatchReport>>> {
    let items = input
        .items
        .iter()
        .map(|item| {
            Ok(BatchItem {
                topic: item.topic.clone(),
                episode_type: item.episode_type.parse()?,
            })
        })
        .collect::<Result<Vec<_>, podscript_core::error::CoreError>>()?;

    let report = state.scripts.generate_batch(&items, input.include_seo).await?;
    Ok(Json(ApiResponse::ok(report)))
}
