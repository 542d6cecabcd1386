//! Integration tests for HttpProber using wiremock
//!
//! These tests validate outcome classification against mock servers.

use std::time::Duration;
use uptime_monitor::prober::{HttpProber, Outcome, Probe};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn prober(timeout: Duration) -> HttpProber {
    HttpProber::new(timeout, "uptime-test/1.0").unwrap()
}

#[tokio::test]
async fn test_probe_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = prober(Duration::from_secs(5))
        .probe(&format!("{}/health", mock_server.uri()))
        .await;

    assert!(matches!(outcome, Outcome::Success { status: 200, .. }));
    assert_eq!(outcome.error(), None);
}

#[tokio::test]
async fn test_probe_sends_user_agent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "uptime-test/1.0"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let outcome = prober(Duration::from_secs(5)).probe(&mock_server.uri()).await;
    assert_eq!(outcome.status_code(), Some(204));
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_probe_not_modified_counts_as_up() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&mock_server)
        .await;

    let outcome = prober(Duration::from_secs(5)).probe(&mock_server.uri()).await;
    assert!(outcome.is_ok());
    assert_eq!(outcome.status_code(), Some(304));
}

#[tokio::test]
async fn test_probe_not_found_is_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let outcome = prober(Duration::from_secs(5))
        .probe(&format!("{}/missing", mock_server.uri()))
        .await;

    assert!(matches!(outcome, Outcome::Rejected { status: 404, .. }));
    assert_eq!(
        outcome.error().as_deref(),
        Some("unexpected status code 404 Not Found")
    );
}

#[tokio::test]
async fn test_probe_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = prober(Duration::from_secs(5)).probe(&mock_server.uri()).await;

    assert!(!outcome.is_ok());
    assert_eq!(outcome.status_code(), Some(500));
    // `expect(1)` is verified when the mock server drops
}

#[tokio::test]
async fn test_probe_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let outcome = prober(Duration::from_millis(250)).probe(&mock_server.uri()).await;

    match &outcome {
        Outcome::Failure { error, latency } => {
            assert_eq!(error, "request timed out after 0.25s");
            assert!(*latency >= Duration::from_millis(250));
            assert!(*latency < Duration::from_secs(3));
        }
        other => panic!("expected timeout failure, got {other:?}"),
    }
    assert_eq!(outcome.status_code(), None);
}

#[tokio::test]
async fn test_probe_connection_refused() {
    // Reserve a port, then free it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let outcome = prober(Duration::from_secs(5))
        .probe(&format!("http://{addr}/"))
        .await;

    assert!(!outcome.is_ok());
    assert_eq!(outcome.status_code(), None);
    let error = outcome.error().unwrap();
    assert!(
        error.starts_with("connection failed"),
        "unexpected error text: {error}"
    );
}
