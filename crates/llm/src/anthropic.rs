use async_trait::async_trait;
use podscript_core::error::{CoreError, UpstreamKind};
use podscript_core::prompt::GenerationRequest;
use podscript_core::providers::{Completion, GenerationProvider, Usage};
use serde::{Deserialize, Serialize};

/// Messages endpoint.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Value sent in the `anthropic-version` header.
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const SERVICE: &str = "generation";

/// Errors from the Messages API layer.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Anthropic API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// A 2xx response that did not contain usable text.
    #[error("Unusable completion: {0}")]
    InvalidResponse(String),
}

/// Map an HTTP status from the API to the kind of upstream failure.
/// Anthropic's 529 "overloaded" lands in `ServerError` with the other 5xx.
pub fn kind_for_status(status: u16) -> UpstreamKind {
    match status {
        429 => UpstreamKind::RateLimited,
        401 | 403 => UpstreamKind::Unauthorized,
        _ => UpstreamKind::ServerError,
    }
}

impl From<LlmError> for CoreError {
    fn from(err: LlmError) -> Self {
        let kind = match &err {
            LlmError::Request(e) if e.is_decode() => UpstreamKind::InvalidResponse,
            LlmError::Request(_) => UpstreamKind::Unreachable,
            LlmError::ApiError { status, .. } => kind_for_status(*status),
            LlmError::InvalidResponse(_) => UpstreamKind::InvalidResponse,
        };
        CoreError::upstream(SERVICE, kind, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl MessagesResponse {
    /// Concatenate the text blocks; non-text blocks are ignored.
    fn into_completion(self) -> Result<Completion, LlmError> {
        let text: String = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text)
            .collect();
        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse(
                "response contained no text content".to_string(),
            ));
        }
        Ok(Completion {
            text,
            usage: Usage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_client(reqwest::Client::new(), DEFAULT_API_URL.to_string(), api_key, model)
    }

    /// Create a client reusing an existing [`reqwest::Client`] and posting to
    /// `api_url` instead of the public endpoint.
    pub fn with_client(client: reqwest::Client, api_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system prompt and one user turn.
    pub async fn create_message(&self, request: &GenerationRequest) -> Result<Completion, LlmError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system_prompt,
            messages: [Message {
                role: "user",
                content: &request.user_prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!(
                model = %self.model,
                max_tokens = request.max_tokens,
                "Completion stopped at the token limit"
            );
        }
        parsed.into_completion()
    }
}

#[async_trait]
impl GenerationProvider for AnthropicClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion, CoreError> {
        match self.create_message(request).await {
            Ok(completion) => {
                tracing::debug!(
                    model = %self.model,
                    input_tokens = completion.usage.input_tokens,
                    output_tokens = completion.usage.output_tokens,
                    "Completion received"
                );
                Ok(completion)
            }
            Err(e) => {
                tracing::error!(model = %self.model, error = %e, "Completion request failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn text_blocks_are_concatenated() {
        let resp: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                { "type": "text", "text": "## Welcome\n" },
                { "type": "tool_use", "id": "t", "name": "x", "input": {} },
                { "type": "text", "text": "Hello." }
            ],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 120, "output_tokens": 8 }
        }))
        .unwrap();

        let completion = resp.into_completion().unwrap();

        assert_eq!(completion.text, "## Welcome\nHello.");
        assert_eq!(completion.usage.input_tokens, 120);
        assert_eq!(completion.usage.output_tokens, 8);
    }

    #[test]
    fn empty_content_is_invalid() {
        let resp: MessagesResponse =
            serde_json::from_value(json!({ "content": [], "usage": {} })).unwrap();

        assert_matches!(resp.into_completion(), Err(LlmError::InvalidResponse(_)));
    }

    #[test]
    fn request_body_shape() {
        let body = MessagesRequest {
            model: "m",
            max_tokens: 6000,
            temperature: 0.5,
            system: "sys",
            messages: [Message {
                role: "user",
                content: "hi",
            }],
        };

        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "m");
        assert_eq!(value["max_tokens"], 6000);
        assert_eq!(value["system"], "sys");
        assert_eq!(value["messages"], json!([{ "role": "user", "content": "hi" }]));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(kind_for_status(429), UpstreamKind::RateLimited);
        assert_eq!(kind_for_status(401), UpstreamKind::Unauthorized);
        assert_eq!(kind_for_status(529), UpstreamKind::ServerError);
        assert_eq!(kind_for_status(500), UpstreamKind::ServerError);
    }

    #[test]
    fn invalid_response_converts_to_core() {
        let err: CoreError = LlmError::InvalidResponse("nothing".into()).into();
        assert_matches!(
            err,
            CoreError::Upstream {
                service: "generation",
                kind: UpstreamKind::InvalidResponse,
                ..
            }
        );
    }
}
