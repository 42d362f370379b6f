//! End-to-end generation against the mock provider.

use super::*;
use coachgen_client::{CoachError, ContentParser, OfflineTemplateProvider, SectionKind};
use pretty_assertions::assert_eq;
use test_case::test_case;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::Mock;

const PLAN: &str = "MONDAY\nFocus: Speed\nWarm-Up (10 minutes)\n• Jog 5 min\n\nKeep hydrated.";

#[tokio::test]
async fn test_generation_success() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", &*format!("Bearer {TEST_API_KEY}")))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 1000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(PLAN)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ManualPathSource::online()).await;
    let document = client.generate("400m sprint week").await.unwrap();

    let tagged: Vec<(SectionKind, &str)> = document
        .iter()
        .map(|s| (s.kind, s.text.as_str()))
        .collect();
    assert_eq!(
        tagged,
        vec![
            (SectionKind::DayHeader, "MONDAY"),
            (SectionKind::FocusLine, "Focus: Speed"),
            (SectionKind::Subheading, "Warm-Up (10 minutes)"),
            (SectionKind::BulletDetail, "• Jog 5 min"),
            (SectionKind::Plain, "Keep hydrated."),
        ]
    );
    assert!(!client.is_offline());
    assert!((*client.progress().borrow() - 1.0).abs() < f64::EPSILON);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "400m sprint week");

    client.shutdown().await;
}

#[tokio::test]
async fn test_repeat_prompt_served_from_cache() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(PLAN)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ManualPathSource::online()).await;
    let first = client.generate("tempo run").await.unwrap();
    let second = client.generate("tempo run").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(error_response(429, "Rate limit reached"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(PLAN)))
        .mount(&server)
        .await;

    let client = client_for(&server, ManualPathSource::online()).await;
    let document = client.generate("hill repeats").await.unwrap();

    assert!(!document.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(client.metrics().snapshot().retries, 2);
}

#[test_case(401, 1 ; "authentication is fatal")]
#[test_case(404, 1 ; "unknown status is fatal")]
#[test_case(500, 3 ; "server errors are retried")]
#[test_case(429, 3 ; "rate limits are retried")]
#[tokio::test]
async fn test_error_statuses(status: u16, expected_calls: usize) {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(error_response(status, "failure"))
        .mount(&server)
        .await;

    let client = client_for(&server, ManualPathSource::online()).await;
    let err = client.generate("long run").await.unwrap_err();

    assert_eq!(err.is_retryable(), expected_calls > 1);
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        expected_calls
    );
    if status == 401 {
        assert!(matches!(err, CoachError::Authentication { .. }));
    }
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body(PLAN))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = CoachConfig::builder()
        .api_key(TEST_API_KEY)
        .base_url(server.uri())
        .request_timeout(Duration::from_millis(100))
        .retry(RetryConfig::no_retries())
        .probe(probe_config(&server, "/generate_204"))
        .build()
        .unwrap();
    let client = GenerationClient::builder()
        .config(config)
        .path_source(Arc::new(ManualPathSource::online()))
        .build()
        .unwrap();
    wait_online(&client).await;

    let err = client.generate("fartlek").await.unwrap_err();

    assert!(matches!(err, CoachError::Timeout { .. }), "{err:?}");
}

#[tokio::test]
async fn test_offline_when_probe_fails() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/generate_204"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server, ManualPathSource::offline()).await;
    let document = client.generate("marathon base phase").await.unwrap();

    let expected = ContentParser::new()
        .parse(OfflineTemplateProvider::new().template_for("marathon base phase"));
    assert_eq!(document, expected);
    assert!(client.is_offline());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/chat/completions"));
}

#[tokio::test]
async fn test_probe_rescues_stale_passive_state() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/generate_204"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(PLAN)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ManualPathSource::offline()).await;
    client.generate("mile time trial").await.unwrap();

    assert!(!client.is_offline());
}
