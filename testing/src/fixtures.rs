use std::sync::atomic::{AtomicU32, Ordering};

use config::{AgentConfig, ConnectionConfig, FallbackConfig};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

pub fn unique_session_id() -> String {
    unique_id("test-session")
}

/// Install a debug-level subscriber once per test process.
pub fn init_tracing() {
    let _ = observability::init_tracing("debug");
}

/// Full upstream completion payload.
pub fn completion_json(id: &str, text: &str, model: &str) -> Value {
    json!({
        "id": id,
        "choices": [{"text": text}],
        "model": model,
        "usage": {
            "prompt_tokens": 5,
            "completion_tokens": 7,
            "total_tokens": 12
        }
    })
}

/// Payload of the simplified endpoint variant.
pub fn simplified_completion_json(text: &str) -> Value {
    json!({
        "text": text,
        "tokens_used": {"input": 3, "output": 4}
    })
}

/// `text/event-stream` body emitting one event per chunk, then `[DONE]`.
pub fn sse_body(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str("data: ");
        body.push_str(&json!({"choices": [{"text": chunk}]}).to_string());
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    body
}

pub async fn mount_healthy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

pub async fn mount_completion(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_json(
                &unique_id("cmpl"),
                text,
                "gpt-3.5-turbo"
            ))
        )
        .mount(server)
        .await;
}

pub async fn mount_upstream_failure(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
        .mount(server)
        .await;
}

pub fn agent_result_envelope(result: Value) -> Value {
    json!({
        "type": "response",
        "id": unique_id("reply"),
        "result": result
    })
}

pub fn agent_error_envelope(code: i64, message: &str) -> Value {
    json!({
        "type": "response",
        "id": unique_id("reply"),
        "error": {"code": code, "message": message}
    })
}

pub fn connection_config_for(server: &MockServer) -> ConnectionConfig {
    ConnectionConfig::for_testing(server.uri())
}

pub fn agent_config_for(server: &MockServer) -> AgentConfig {
    AgentConfig::for_testing(server.uri())
}

/// Defaults with no artificial delay between mock stream tokens.
pub fn fallback_config_for_tests() -> FallbackConfig {
    FallbackConfig {
        mock_stream_delay_ms: 0,
        ..FallbackConfig::default()
    }
}

/// An address nothing listens on.
pub fn unreachable_config() -> ConnectionConfig {
    ConnectionConfig {
        max_retries: 2,
        ..ConnectionConfig::for_testing("http://127.0.0.1:9")
    }
}
