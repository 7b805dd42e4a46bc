#![allow(clippy::unwrap_used)]
// End-to-end push mode: seed from wiremock, updates from an in-process
// WebSocket server.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devwatch_api::{ReconnectConfig, SnapshotClient};
use devwatch_core::{
    ConnectionState, Dashboard, DeviceCount, DriverOptions, HttpSnapshotSource, LiveDriver,
    MemorySink, ResponseOrdering, SyncDriver, SyncMode,
};

#[tokio::test]
async fn seed_subscribe_and_merge_delta() {
    let http = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Router1", "ip_address": "192.168.0.1", "status": "Up" },
            { "id": 2, "name": "Switch2", "ip_address": "192.168.0.2", "status": "Up" }
        ])))
        .mount(&http)
        .await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap();
    let (go_tx, go_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let announce = ws.next().await.unwrap().unwrap();
        go_rx.await.unwrap();
        let delta = json!({ "event": "device_status", "data": { "id": 2, "status": "Down" } });
        ws.send(Message::text(delta.to_string())).await.unwrap();
        // Hold the socket open until the client goes away.
        while ws.next().await.is_some() {}
        serde_json::from_str::<serde_json::Value>(announce.to_text().unwrap()).unwrap()
    });

    let endpoint = Url::parse(&format!("{}/devices", http.uri())).unwrap();
    let source = HttpSnapshotSource::new(SnapshotClient::with_client(
        reqwest::Client::new(),
        endpoint,
    ));
    let options = DriverOptions {
        mode: SyncMode::Push,
        count: DeviceCount::parse("2"),
        ordering: ResponseOrdering::Arrival,
        push_url: Url::parse(&format!("ws://{ws_addr}")).unwrap(),
        event_name: "device_status".into(),
        reconnect: ReconnectConfig::default(),
    };
    let cancel = CancellationToken::new();
    let mut driver = LiveDriver::connect(source, &options, cancel.clone());
    let mut dash = Dashboard::new(MemorySink::new());
    driver.start(&mut dash);

    // Seed and Connected arrive in either order.
    let seeded = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = driver.next_event().await;
            driver.apply(event, &mut dash);
            let connected = dash.sink().connection_state == Some(ConnectionState::Connected);
            if connected && !driver.is_busy() {
                break;
            }
        }
    })
    .await;
    assert!(seeded.is_ok(), "never seeded and connected");
    assert_eq!(dash.sink().rows.len(), 2);

    go_tx.send(()).unwrap();
    let event = tokio::time::timeout(Duration::from_secs(5), driver.next_event())
        .await
        .unwrap();
    driver.apply(event, &mut dash);

    assert_eq!(dash.sink().connection_state, Some(ConnectionState::Connected));
    assert_eq!(dash.sink().rows.len(), 2);
    assert_eq!(dash.sink().rows[1].status(), "Down");
    assert_eq!(dash.sink().rows[1].name(), "Switch2");

    cancel.cancel();
    drop(driver);
    let announce = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        announce,
        json!({ "event": "subscribe_devices", "data": { "n": 2 } })
    );
}
