// ── Push driver ──
//
// One long-lived subscription plus pull-style seeding. Channel events are
// applied strictly in arrival order. Connection trouble only ever changes
// the connection state; the data and its sync state are left alone.

use std::future::Future;

use chrono::Utc;
use devwatch_api::ChannelEvent;

use super::{
    ConnectionState, DriverEvent, PresentationSink, PullDriver, ResponseOrdering, SnapshotSource,
    SyncDriver, SyncMode, Trigger, UpdateSource,
};
use crate::dashboard::Dashboard;
use crate::model::DeviceCount;
use crate::payload::PushPayload;

/// Drives the dashboard from a push subscription.
pub struct PushDriver<F, U> {
    seeder: PullDriver<F>,
    updates: U,
    channel_open: bool,
}

impl<F: SnapshotSource, U: UpdateSource> PushDriver<F, U> {
    pub fn new(source: F, updates: U, count: DeviceCount) -> Self {
        Self {
            seeder: PullDriver::new(source, count),
            updates,
            channel_open: true,
        }
    }

    /// Ordering policy for seed requests.
    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.seeder = self.seeder.with_ordering(ordering);
        self
    }

    /// `false` once the update source has shut down for good.
    pub fn channel_open(&self) -> bool {
        self.channel_open
    }

    fn apply_channel<S: PresentationSink>(
        &mut self,
        event: ChannelEvent,
        dashboard: &mut Dashboard<S>,
    ) {
        match event {
            ChannelEvent::Connected => {
                tracing::info!(count = %self.seeder.count(), "push channel connected, subscribing");
                dashboard.set_connection_state(ConnectionState::Connected);
                self.updates.announce(self.seeder.count());
            }
            ChannelEvent::Disconnected { reason } => {
                tracing::info!(%reason, "push channel disconnected");
                dashboard.set_connection_state(ConnectionState::Disconnected);
            }
            ChannelEvent::Error { message } => {
                tracing::warn!(%message, "push channel error");
                dashboard.set_connection_state(ConnectionState::Error);
                dashboard.report_error(&format!("Socket error: {message}"));
            }
            ChannelEvent::Message(value) => match PushPayload::classify(value) {
                PushPayload::Snapshot(records) => {
                    tracing::debug!(devices = records.len(), "push snapshot");
                    dashboard.replace_all(records);
                    dashboard.mark_updated(Utc::now());
                }
                PushPayload::Delta(patch) => {
                    let id = patch.id;
                    let outcome = dashboard.merge_one(patch);
                    tracing::debug!(%id, ?outcome, "push delta");
                    dashboard.mark_updated(Utc::now());
                }
                PushPayload::Unrecognized => {}
            },
        }
    }
}

impl<F: SnapshotSource, U: UpdateSource> SyncDriver for PushDriver<F, U> {
    fn mode(&self) -> SyncMode {
        SyncMode::Push
    }

    fn count(&self) -> DeviceCount {
        self.seeder.count()
    }

    fn start<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>) {
        dashboard.echo_count(self.seeder.count());
        dashboard.set_connection_state(ConnectionState::Disconnected);
        self.seeder.issue(Trigger::Seed, dashboard);
    }

    fn refresh<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>) {
        self.seeder.issue(Trigger::Manual, dashboard);
    }

    /// Re-announce the new count and reseed immediately.
    fn set_count<S: PresentationSink>(&mut self, count: DeviceCount, dashboard: &mut Dashboard<S>) {
        self.seeder.store_count(count, dashboard);
        self.updates.announce(count);
        self.seeder.issue(Trigger::Seed, dashboard);
    }

    fn is_busy(&self) -> bool {
        self.seeder.is_busy()
    }

    fn next_event(&mut self) -> impl Future<Output = DriverEvent> + Send {
        async move {
            loop {
                tokio::select! {
                    outcome = self.seeder.next_outcome() => return DriverEvent::Snapshot(outcome),
                    event = self.updates.recv(), if self.channel_open => match event {
                        Some(event) => return DriverEvent::Channel(event),
                        None => {
                            tracing::warn!("push channel shut down, no further updates");
                            self.channel_open = false;
                        }
                    },
                }
            }
        }
    }

    fn apply<S: PresentationSink>(&mut self, event: DriverEvent, dashboard: &mut Dashboard<S>) {
        match event {
            DriverEvent::Snapshot(outcome) => self.seeder.apply_outcome(outcome, dashboard),
            DriverEvent::Channel(event) => self.apply_channel(event, dashboard),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::future::Future;

    use futures::FutureExt;
    use futures::future::BoxFuture;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    use super::*;
    use crate::error::CoreError;
    use crate::sync::{MemorySink, SyncState};

    /// Snapshot source with a fixed answer.
    #[derive(Clone)]
    struct FixedSource(Result<Value, CoreError>);

    impl SnapshotSource for FixedSource {
        fn fetch(&self, _count: DeviceCount) -> BoxFuture<'static, Result<Value, CoreError>> {
            let reply = self.0.clone();
            async move { reply }.boxed()
        }
    }

    /// Update source fed by the test through a channel.
    struct FakeChannel {
        events: mpsc::UnboundedReceiver<ChannelEvent>,
        announced: Vec<u16>,
    }

    impl UpdateSource for FakeChannel {
        fn announce(&mut self, count: DeviceCount) {
            self.announced.push(count.get());
        }

        fn recv(&mut self) -> impl Future<Output = Option<ChannelEvent>> + Send {
            self.events.recv()
        }
    }

    type Driver = PushDriver<FixedSource, FakeChannel>;

    fn setup(
        seed: Result<Value, CoreError>,
    ) -> (mpsc::UnboundedSender<ChannelEvent>, Driver, Dashboard<MemorySink>) {
        let (tx, events) = mpsc::unbounded_channel();
        let channel = FakeChannel {
            events,
            announced: Vec::new(),
        };
        let driver = PushDriver::new(FixedSource(seed), channel, DeviceCount::clamped(3));
        (tx, driver, Dashboard::new(MemorySink::new()))
    }

    async fn pump(driver: &mut Driver, dash: &mut Dashboard<MemorySink>) {
        let event = driver.next_event().await;
        driver.apply(event, dash);
    }

    fn seed_body() -> Value {
        json!([
            { "id": 1, "name": "Router1", "ip_address": "192.168.0.1", "status": "Up" },
            { "id": 2, "name": "Switch2", "ip_address": "192.168.0.2", "status": "Up" }
        ])
    }

    #[tokio::test]
    async fn seed_then_connect_announces_count() {
        let (tx, mut driver, mut dash) = setup(Ok(seed_body()));
        driver.start(&mut dash);
        pump(&mut driver, &mut dash).await;
        assert_eq!(dash.store().len(), 2);

        tx.send(ChannelEvent::Connected).unwrap();
        pump(&mut driver, &mut dash).await;
        assert_eq!(dash.sink().connection_state, Some(ConnectionState::Connected));
        assert_eq!(driver.updates.announced, vec![3]);
    }

    #[tokio::test]
    async fn delta_merges_and_updates_timestamp() {
        let (tx, mut driver, mut dash) = setup(Ok(seed_body()));
        driver.start(&mut dash);
        pump(&mut driver, &mut dash).await;
        let seeded_at = dash.sink().last_updated;

        tx.send(ChannelEvent::Message(json!({ "id": 2, "status": "Down" })))
            .unwrap();
        tx.send(ChannelEvent::Message(json!({ "id": 9, "name": "AP9" })))
            .unwrap();
        pump(&mut driver, &mut dash).await;
        pump(&mut driver, &mut dash).await;

        let rows = &dash.sink().rows;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].status(), "Down");
        assert_eq!(rows[1].name(), "Switch2");
        assert_eq!(rows[2].name(), "AP9");
        assert!(dash.sink().last_updated >= seeded_at);
    }

    #[tokio::test]
    async fn snapshot_message_replaces_collection() {
        let (tx, mut driver, mut dash) = setup(Ok(seed_body()));
        driver.start(&mut dash);
        pump(&mut driver, &mut dash).await;

        tx.send(ChannelEvent::Message(json!([{ "id": 7, "status": "Up" }])))
            .unwrap();
        pump(&mut driver, &mut dash).await;

        let ids: Vec<i64> = dash.sink().rows.iter().map(|d| d.id.unwrap().get()).collect();
        assert_eq!(ids, vec![7]);
    }

    #[tokio::test]
    async fn unrecognized_message_changes_nothing() {
        let (tx, mut driver, mut dash) = setup(Ok(seed_body()));
        driver.start(&mut dash);
        pump(&mut driver, &mut dash).await;
        let before = dash.sink().clone();

        tx.send(ChannelEvent::Message(json!({ "status": "Down" })))
            .unwrap();
        tx.send(ChannelEvent::Message(json!("hello"))).unwrap();
        pump(&mut driver, &mut dash).await;
        pump(&mut driver, &mut dash).await;

        assert_eq!(dash.sink(), &before);
    }

    #[tokio::test]
    async fn channel_error_leaves_sync_state_alone() {
        let (tx, mut driver, mut dash) = setup(Ok(seed_body()));
        driver.start(&mut dash);
        pump(&mut driver, &mut dash).await;

        tx.send(ChannelEvent::Error {
            message: "connection refused".into(),
        })
        .unwrap();
        pump(&mut driver, &mut dash).await;

        assert_eq!(dash.sink().connection_state, Some(ConnectionState::Error));
        assert_eq!(dash.sink().sync_state, Some(SyncState::Ready));
        assert_eq!(
            dash.sink().errors,
            vec!["Socket error: connection refused".to_owned()]
        );
        assert_eq!(dash.store().len(), 2);

        tx.send(ChannelEvent::Disconnected {
            reason: "closed".into(),
        })
        .unwrap();
        pump(&mut driver, &mut dash).await;
        assert_eq!(dash.sink().connection_state, Some(ConnectionState::Disconnected));
        assert_eq!(dash.sink().sync_state, Some(SyncState::Ready));
    }

    #[tokio::test]
    async fn seed_failure_uses_initial_fetch_prefix() {
        let (_tx, mut driver, mut dash) = setup(Err(CoreError::Http { status: 502 }));
        driver.start(&mut dash);
        pump(&mut driver, &mut dash).await;

        assert_eq!(
            dash.sink().sync_state,
            Some(SyncState::Error("Initial fetch failed: HTTP 502".into()))
        );
        assert!(dash.sink().errors.is_empty());
    }

    #[tokio::test]
    async fn count_change_reannounces_and_reseeds() {
        let (_tx, mut driver, mut dash) = setup(Ok(seed_body()));
        driver.start(&mut dash);
        pump(&mut driver, &mut dash).await;

        driver.set_count(DeviceCount::parse("0"), &mut dash);
        assert_eq!(driver.updates.announced, vec![1]);
        assert!(driver.is_busy());
        pump(&mut driver, &mut dash).await;
        assert!(!driver.is_busy());
    }

    #[tokio::test]
    async fn clear_empties_table() {
        let (_tx, mut driver, mut dash) = setup(Ok(seed_body()));
        driver.start(&mut dash);
        pump(&mut driver, &mut dash).await;

        driver.clear(&mut dash);
        assert!(dash.store().is_empty());
        assert_eq!(dash.sink().sync_state, Some(SyncState::Empty));
    }

    #[tokio::test]
    async fn closed_channel_still_delivers_seeds() {
        let (tx, mut driver, mut dash) = setup(Ok(seed_body()));
        drop(tx);
        driver.start(&mut dash);
        pump(&mut driver, &mut dash).await;

        assert_eq!(dash.store().len(), 2);
        assert_eq!(dash.sink().sync_state, Some(SyncState::Ready));
    }
}
