use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use podscript_core::error::{CoreError, UpstreamKind};
use serde_json::json;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Everything a handler can fail with, rendered as
/// `{ "success": false, "error": { "message", "code", "details"? } }`.
///
/// Upstream and internal messages are logged in full but only summarised in
/// the response body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Field-level failures from `validator`; listed under `details`.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Malformed JSON or query string.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

const SANITIZED: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
                CoreError::Upstream {
                    service,
                    kind,
                    message,
                } => {
                    tracing::error!(service, %kind, error = %message, "Upstream call failed");
                    match kind {
                        UpstreamKind::RateLimited => (
                            StatusCode::TOO_MANY_REQUESTS,
                            "RATE_LIMITED",
                            format!("The {service} service is rate limiting requests"),
                        ),
                        _ => (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "UPSTREAM_ERROR",
                            format!("The {service} service failed: {kind}"),
                        ),
                    }
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        SANITIZED.to_string(),
                    )
                }
            },

            AppError::Validation(errors) => {
                details = Some(field_messages(errors));
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "Request validation failed".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    SANITIZED.to_string(),
                )
            }
        };

        let mut error = json!({
            "message": message,
            "code": code,
        });
        if let Some(details) = details {
            error["details"] = json!(details);
        }

        let body = json!({
            "success": false,
            "error": error,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Flatten validation errors into `field path -> messages`, with nested
/// list items addressed as `items[1].topic`.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    collect_messages(errors, "", &mut out);
    out
}

fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = list
                    .iter()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => format!("failed `{}` check", e.code),
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}
