#![allow(clippy::unwrap_used)]
// Integration tests for `SnapshotClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devwatch_api::{Error, SnapshotClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SnapshotClient) {
    let server = MockServer::start().await;
    let endpoint = Url::parse(&format!("{}/devices", server.uri())).unwrap();
    let client = SnapshotClient::with_client(reqwest::Client::new(), endpoint);
    (server, client)
}

// ── Snapshot tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_devices_returns_array_body() {
    let (server, client) = setup().await;

    let body = json!([
        { "id": 1, "name": "Router1", "ip_address": "192.168.0.1", "status": "Up" },
        { "id": 2, "name": "Switch2", "ip_address": "192.168.0.2", "status": "Down" }
    ]);

    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(query_param("n", "2"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let value = client.fetch_devices(2, None).await.unwrap();
    assert_eq!(value, body);
}

#[tokio::test]
async fn test_fetch_devices_passes_seed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(query_param("n", "5"))
        .and(query_param("seed", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let value = client.fetch_devices(5, Some(42)).await.unwrap();
    assert_eq!(value, json!([]));
}

#[tokio::test]
async fn test_fetch_devices_non_array_body_is_not_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let value = client.fetch_devices(10, None).await.unwrap();
    assert!(value.is_object());
}

#[tokio::test]
async fn test_fetch_devices_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "Invalid 'n', must be integer >= 1" })),
        )
        .mount(&server)
        .await;

    let err = client.fetch_devices(10, None).await.unwrap_err();
    assert!(
        matches!(err, Error::Status { status: 400, .. }),
        "expected Status error, got: {err:?}"
    );
    assert_eq!(err.to_string(), "HTTP 400");
}

#[tokio::test]
async fn test_fetch_devices_invalid_json() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.fetch_devices(10, None).await.unwrap_err();
    assert!(
        matches!(err, Error::Deserialization { .. }),
        "expected Deserialization error, got: {err:?}"
    );
}

#[tokio::test]
async fn test_fetch_devices_connection_refused() {
    // Nothing listens on the discard port locally.
    let endpoint = Url::parse("http://127.0.0.1:9/devices").unwrap();
    let client = SnapshotClient::with_client(reqwest::Client::new(), endpoint);

    let err = client.fetch_devices(10, None).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(err.is_transient());
}

// ── Health tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_ok() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let health = client.health().await.unwrap();
    assert!(health.is_ok());
}

#[tokio::test]
async fn test_health_failure_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.health().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}
