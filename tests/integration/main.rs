//! Integration tests using WireMock
//!
//! These tests drive the full request/response cycle against a local mock
//! HTTP server: serialization, authentication headers, status classification,
//! retries and the reachability probe.

mod generation;
mod probe;

use coachgen_client::{
    CoachConfig, GenerationClient, InterfaceClass, ManualPathSource, PathStatus, ProbeConfig,
    RetryConfig,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "sk-integration-test-key";

/// Starts a fresh mock server.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Probe configuration aimed at the mock server.
pub fn probe_config(server: &MockServer, path: &str) -> ProbeConfig {
    ProbeConfig {
        endpoints: vec![format!("{}{path}", server.uri())],
        endpoint_timeout: Duration::from_millis(500),
        overall_timeout: Duration::from_secs(2),
    }
}

/// Client talking to the mock server, with a short retry backoff.
///
/// Passive state starts offline, so for an online source this waits until
/// the watchers have reported before handing the client out.
pub async fn client_for(server: &MockServer, source: ManualPathSource) -> GenerationClient {
    let online = source.status(InterfaceClass::Primary) == PathStatus::Satisfied;
    let config = CoachConfig::builder()
        .api_key(TEST_API_KEY)
        .base_url(server.uri())
        .retry(RetryConfig::new().backoff(Duration::from_millis(20)))
        .probe(probe_config(server, "/generate_204"))
        .build()
        .expect("valid config");

    let client = GenerationClient::builder()
        .config(config)
        .path_source(Arc::new(source))
        .build()
        .expect("client builds");

    if online {
        wait_online(&client).await;
    }
    client
}

/// Waits until the passive monitor reports connectivity.
pub async fn wait_online(client: &GenerationClient) {
    let mut state = client.connectivity().subscribe();
    tokio::time::timeout(Duration::from_secs(1), state.wait_for(|s| s.online()))
        .await
        .expect("monitor came online")
        .expect("monitor running");
}

/// Chat completion body whose first choice carries `content`.
pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-integration-123",
        "object": "chat.completion",
        "created": 1_677_652_288,
        "model": "gpt-3.5-turbo",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

/// Provider error envelope.
pub fn error_response(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "error": {"message": message, "type": "invalid_request_error"}
    }))
}
