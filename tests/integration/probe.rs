//! Reachability probe against the mock server.

use super::*;
use coachgen_client::{HttpProbe, ReachabilityProbe};
use wiremock::matchers::{method, path};
use wiremock::Mock;

#[tokio::test]
async fn test_probe_success() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/generate_204"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let probe = HttpProbe::new(probe_config(&server, "/generate_204")).unwrap();

    assert!(probe.probe().await);
}

#[tokio::test]
async fn test_probe_falls_through_to_next_endpoint() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProbeConfig {
        endpoints: vec![
            format!("{}/down", server.uri()),
            format!("{}/up", server.uri()),
        ],
        ..probe_config(&server, "/unused")
    };
    let probe = HttpProbe::new(config).unwrap();

    assert!(probe.probe().await);
}

#[tokio::test]
async fn test_probe_stops_at_first_success() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/first"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let config = ProbeConfig {
        endpoints: vec![
            format!("{}/first", server.uri()),
            format!("{}/second", server.uri()),
        ],
        ..probe_config(&server, "/unused")
    };
    let probe = HttpProbe::new(config).unwrap();

    assert!(probe.probe().await);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_probe_endpoint_timeout() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(ProbeConfig {
        endpoints: vec![format!("{}/slow", server.uri())],
        endpoint_timeout: Duration::from_millis(100),
        overall_timeout: Duration::from_secs(1),
    })
    .unwrap();

    let start = std::time::Instant::now();
    assert!(!probe.probe().await);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_probe_unreachable_host() {
    let probe = HttpProbe::new(ProbeConfig {
        endpoints: vec!["http://127.0.0.1:9/".to_string()],
        endpoint_timeout: Duration::from_millis(200),
        overall_timeout: Duration::from_millis(500),
    })
    .unwrap();

    assert!(!probe.probe().await);
}

#[tokio::test]
async fn test_probe_overall_timeout_bounds_slow_endpoints() {
    let server = setup_mock_server().await;

    for slow in ["/slow-a", "/slow-b", "/slow-c"] {
        Mock::given(method("GET"))
            .and(path(slow))
            .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;
    }

    let probe = HttpProbe::new(ProbeConfig {
        endpoints: ["/slow-a", "/slow-b", "/slow-c"]
            .iter()
            .map(|p| format!("{}{p}", server.uri()))
            .collect(),
        endpoint_timeout: Duration::from_millis(400),
        overall_timeout: Duration::from_millis(500),
    })
    .unwrap();

    let start = std::time::Instant::now();
    assert!(!probe.probe().await);
    assert!(start.elapsed() < Duration::from_millis(1000), "{:?}", start.elapsed());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() < 3, "{}", requests.len());
}
