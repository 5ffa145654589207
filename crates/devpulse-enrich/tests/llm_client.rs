//! Integration tests for `LlmClient` using wiremock HTTP mocks.

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devpulse_enrich::{EnrichError, LlmClient, TextGenerator};

fn endpoint(server: &MockServer) -> String {
    format!("{}/v1/chat/completions", server.uri())
}

#[tokio::test]
async fn generate_returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({ "temperature": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "{\"ok\": true}" } }
            ]
        })))
        .mount(&server)
        .await;

    let client =
        LlmClient::new(&endpoint(&server), None, "test-model", 5).expect("client should build");
    let reply = client.generate("analyze this").await.expect("should reply");
    assert_eq!(reply, "{\"ok\": true}");
}

#[tokio::test]
async fn api_key_is_sent_as_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "hi" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::new(&endpoint(&server), Some("secret-key"), "test-model", 5)
        .expect("client should build");
    client.generate("prompt").await.expect("should reply");
}

#[tokio::test]
async fn rate_limit_is_classified_with_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "12")
                .set_body_string("slow down"),
        )
        .mount(&server)
        .await;

    let client =
        LlmClient::new(&endpoint(&server), None, "test-model", 5).expect("client should build");
    let result = client.generate("prompt").await;
    match result {
        Err(EnrichError::RateLimited { retry_after_secs }) => assert_eq!(retry_after_secs, 12),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn insufficient_quota_is_classified_as_quota_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": { "type": "insufficient_quota", "message": "You exceeded your quota" }
        })))
        .mount(&server)
        .await;

    let client =
        LlmClient::new(&endpoint(&server), None, "test-model", 5).expect("client should build");
    let result = client.generate("prompt").await;
    assert!(
        matches!(result, Err(EnrichError::QuotaExceeded(_))),
        "quota exhaustion must not look like a plain rate limit"
    );
}

#[tokio::test]
async fn server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client =
        LlmClient::new(&endpoint(&server), None, "test-model", 5).expect("client should build");
    let result = client.generate("prompt").await;
    match result {
        Err(e @ EnrichError::Unavailable(_)) => assert!(e.is_transient()),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_request_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
        .mount(&server)
        .await;

    let client =
        LlmClient::new(&endpoint(&server), None, "test-model", 5).expect("client should build");
    let result = client.generate("prompt").await;
    assert!(matches!(result, Err(EnrichError::Api(_))));
}

#[tokio::test]
async fn empty_choices_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;

    let client =
        LlmClient::new(&endpoint(&server), None, "test-model", 5).expect("client should build");
    let result = client.generate("prompt").await;
    assert!(matches!(result, Err(EnrichError::Api(_))));
}
