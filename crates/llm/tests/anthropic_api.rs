//! Integration tests for `AnthropicClient` against an in-process fake of the
//! Messages endpoint.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use podscript_core::error::{CoreError, UpstreamKind};
use podscript_core::prompt::GenerationRequest;
use podscript_core::providers::GenerationProvider;
use podscript_llm::anthropic::ANTHROPIC_API_VERSION;
use podscript_llm::AnthropicClient;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn messages(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    seen.requests.lock().unwrap().push((headers, body.clone()));
    match body["system"].as_str() {
        Some("rate-limit me") => Err((
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"type":"error","error":{"type":"rate_limit_error"}}"#.into(),
        )),
        Some("reject me") => Err((StatusCode::UNAUTHORIZED, "invalid x-api-key".into())),
        Some("overload me") => Err((StatusCode::from_u16(529).unwrap(), "overloaded".into())),
        _ => Ok(Json(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": body["model"],
            "content": [{ "type": "text", "text": "## Welcome\nHi there." }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 42, "output_tokens": 5 }
        }))),
    }
}

async fn spawn_fake() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1/messages"), seen)
}

fn client(url: &str) -> AnthropicClient {
    AnthropicClient::with_client(
        reqwest::Client::new(),
        url.to_string(),
        "sk-test".into(),
        "claude-test".into(),
    )
}

fn request(system: &str) -> GenerationRequest {
    GenerationRequest {
        system_prompt: system.into(),
        user_prompt: "Write a friday script.".into(),
        max_tokens: 6000,
        temperature: 0.7,
    }
}

#[tokio::test]
async fn sends_headers_and_returns_text() {
    let (url, seen) = spawn_fake().await;

    let completion = client(&url).complete(&request("You write scripts.")).await.unwrap();

    assert_eq!(completion.text, "## Welcome\nHi there.");
    assert_eq!(completion.usage.output_tokens, 5);

    let requests = seen.requests.lock().unwrap();
    let (headers, body) = &requests[0];
    assert_eq!(headers["x-api-key"], "sk-test");
    assert_eq!(headers["anthropic-version"], ANTHROPIC_API_VERSION);
    assert_eq!(body["model"], "claude-test");
    assert_eq!(body["max_tokens"], 6000);
    assert_eq!(body["messages"][0]["content"], "Write a friday script.");
}

#[tokio::test]
async fn rate_limit_is_distinguished() {
    let (url, _) = spawn_fake().await;

    assert_matches!(
        client(&url).complete(&request("rate-limit me")).await,
        Err(CoreError::Upstream {
            kind: UpstreamKind::RateLimited,
            ..
        })
    );
}

#[tokio::test]
async fn bad_key_is_unauthorized() {
    let (url, _) = spawn_fake().await;

    assert_matches!(
        client(&url).complete(&request("reject me")).await,
        Err(CoreError::Upstream {
            kind: UpstreamKind::Unauthorized,
            ..
        })
    );
}

#[tokio::test]
async fn overload_is_server_error() {
    let (url, _) = spawn_fake().await;

    assert_matches!(
        client(&url).complete(&request("overload me")).await,
        Err(CoreError::Upstream {
            kind: UpstreamKind::ServerError,
            ..
        })
    );
}
