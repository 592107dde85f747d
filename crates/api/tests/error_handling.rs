//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router or
//! collaborator is involved.

use std::borrow::Cow;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use podscript_api::error::{field_messages, AppError};
use podscript_core::error::{CoreError, UpstreamKind};
use validator::{Validate, ValidationError, ValidationErrors};

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Core errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound("no episode matches topic 'x'".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert_eq!(json["error"]["message"], "no episode matches topic 'x'");
    assert!(json["error"].get("details").is_none());
}

#[tokio::test]
async fn core_validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("topic must not be empty".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"]["message"], "topic must not be empty");
}

#[tokio::test]
async fn rate_limited_upstream_returns_429() {
    let err = AppError::Core(CoreError::upstream(
        "generation",
        UpstreamKind::RateLimited,
        "{\"type\":\"rate_limit_error\"}",
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "RATE_LIMITED");
    assert_eq!(
        json["error"]["message"],
        "The generation service is rate limiting requests"
    );
}

#[tokio::test]
async fn other_upstream_failures_return_500_without_raw_body() {
    for kind in [
        UpstreamKind::Unauthorized,
        UpstreamKind::ServerError,
        UpstreamKind::Unreachable,
        UpstreamKind::InvalidResponse,
    ] {
        let err = AppError::Core(CoreError::upstream("spreadsheet", kind, "raw upstream body"));

        let (status, json) = error_to_response(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "UPSTREAM_ERROR");
        let message = json["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("The spreadsheet service failed"));
        assert!(!message.contains("raw upstream body"));
    }
}

#[tokio::test]
async fn core_internal_error_is_sanitized() {
    let err = AppError::Core(CoreError::Internal("key file at /etc/secret".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"]["message"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// HTTP-specific errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid field value".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    assert_eq!(json["error"]["message"], "invalid field value");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret api key leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"]["message"], "An internal error occurred");
}

#[tokio::test]
async fn validation_errors_carry_field_details() {
    let mut errors = ValidationErrors::new();
    errors.add(
        "limit",
        ValidationError::new("range").with_message(Cow::Borrowed("limit must be between 1 and 50")),
    );

    let (status, json) = error_to_response(AppError::Validation(errors)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"]["message"], "Request validation failed");
    assert_eq!(
        json["error"]["details"]["limit"][0],
        "limit must be between 1 and 50"
    );
}

// ---------------------------------------------------------------------------
// field_messages
// ---------------------------------------------------------------------------

#[derive(Validate)]
struct Item {
    #[validate(length(min = 1))]
    name: String,
}

#[derive(Validate)]
struct Wrapper {
    #[validate(nested)]
    items: Vec<Item>,
}

#[test]
fn nested_list_errors_use_indexed_paths() {
    let wrapper = Wrapper {
        items: vec![
            Item { name: "ok".into() },
            Item {
                name: String::new(),
            },
        ],
    };

    let errors = wrapper.validate().unwrap_err();
    let messages = field_messages(&errors);

    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages["items[1].name"],
        vec!["failed `length` check".to_string()]
    );
}
