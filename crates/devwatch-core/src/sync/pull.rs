// ── Pull driver ──
//
// On-demand snapshot requests. Every trigger issues a new request; they
// run concurrently and complete in whatever order the server answers.
// Each request carries a sequence number so the `Issue` ordering policy
// can drop completions that were overtaken.

use std::future::Future;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};

use super::{
    DriverEvent, PresentationSink, ResponseOrdering, SnapshotOutcome, SnapshotSource, SyncDriver,
    SyncMode, Trigger,
};
use crate::dashboard::Dashboard;
use crate::model::DeviceCount;
use crate::payload::snapshot_records;

/// Drives the dashboard from on-demand snapshot requests.
pub struct PullDriver<F> {
    source: F,
    count: DeviceCount,
    ordering: ResponseOrdering,
    next_seq: u64,
    newest_applied: Option<u64>,
    in_flight: FuturesUnordered<BoxFuture<'static, SnapshotOutcome>>,
}

impl<F: SnapshotSource> PullDriver<F> {
    pub fn new(source: F, count: DeviceCount) -> Self {
        Self {
            source,
            count,
            ordering: ResponseOrdering::default(),
            next_seq: 0,
            newest_applied: None,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }

    /// Number of requests issued but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Start a request for the current count. Returns its sequence number.
    pub fn issue<S: PresentationSink>(
        &mut self,
        trigger: Trigger,
        dashboard: &mut Dashboard<S>,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        let count = self.count;
        tracing::debug!(seq, %count, ?trigger, "requesting snapshot");
        dashboard.begin_loading();

        let request = self.source.fetch(count);
        self.in_flight.push(
            async move {
                SnapshotOutcome {
                    seq,
                    trigger,
                    result: request.await,
                }
            }
            .boxed(),
        );
        seq
    }

    /// Change the count without issuing a request.
    pub(crate) fn store_count<S: PresentationSink>(
        &mut self,
        count: DeviceCount,
        dashboard: &mut Dashboard<S>,
    ) {
        self.count = count;
        dashboard.echo_count(count);
    }

    /// Next finished request. Pending forever while nothing is in flight.
    pub async fn next_outcome(&mut self) -> SnapshotOutcome {
        match self.in_flight.next().await {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }

    /// Apply a finished request to the dashboard.
    pub fn apply_outcome<S: PresentationSink>(
        &mut self,
        outcome: SnapshotOutcome,
        dashboard: &mut Dashboard<S>,
    ) {
        let SnapshotOutcome {
            seq,
            trigger,
            result,
        } = outcome;

        if self.ordering == ResponseOrdering::Issue {
            if let Some(newest) = self.newest_applied.filter(|&newest| seq < newest) {
                tracing::debug!(seq, newest, "discarding stale snapshot response");
                return;
            }
        }
        self.newest_applied = Some(self.newest_applied.map_or(seq, |newest| newest.max(seq)));

        match result {
            Ok(body) => {
                let records = snapshot_records(body);
                tracing::debug!(seq, devices = records.len(), "snapshot applied");
                dashboard.replace_all(records);
                dashboard.mark_updated(Utc::now());
            }
            Err(err) => {
                tracing::warn!(seq, ?trigger, error = %err, "snapshot request failed");
                dashboard.fail(format!("{}: {err}", trigger.failure_prefix()));
                if trigger.raises_toast() {
                    dashboard.report_error(&format!("Couldn't refresh devices: {err}"));
                }
            }
        }
    }
}

impl<F: SnapshotSource> SyncDriver for PullDriver<F> {
    fn mode(&self) -> SyncMode {
        SyncMode::Pull
    }

    fn count(&self) -> DeviceCount {
        self.count
    }

    fn start<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>) {
        dashboard.echo_count(self.count);
        self.issue(Trigger::Initial, dashboard);
    }

    fn refresh<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>) {
        self.issue(Trigger::Manual, dashboard);
    }

    fn set_count<S: PresentationSink>(&mut self, count: DeviceCount, dashboard: &mut Dashboard<S>) {
        self.store_count(count, dashboard);
        self.issue(Trigger::CountChanged, dashboard);
    }

    fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    fn next_event(&mut self) -> impl Future<Output = DriverEvent> + Send {
        async move { DriverEvent::Snapshot(self.next_outcome().await) }
    }

    fn apply<S: PresentationSink>(&mut self, event: DriverEvent, dashboard: &mut Dashboard<S>) {
        match event {
            DriverEvent::Snapshot(outcome) => self.apply_outcome(outcome, dashboard),
            DriverEvent::Channel(event) => {
                tracing::debug!(?event, "pull driver ignoring channel event");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use futures::channel::oneshot;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tokio_test::{assert_pending, task};

    use super::*;
    use crate::error::CoreError;
    use crate::sync::{MemorySink, SyncState};

    type Reply = Result<Value, CoreError>;

    /// Source whose responses the test releases by hand, in any order.
    #[derive(Clone, Default)]
    struct ManualSource {
        pending: Arc<Mutex<VecDeque<oneshot::Sender<Reply>>>>,
        requested: Arc<Mutex<Vec<u16>>>,
    }

    impl ManualSource {
        fn take_reply(&self) -> oneshot::Sender<Reply> {
            self.pending.lock().unwrap().pop_front().unwrap()
        }
    }

    impl SnapshotSource for ManualSource {
        fn fetch(&self, count: DeviceCount) -> BoxFuture<'static, Reply> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push_back(tx);
            self.requested.lock().unwrap().push(count.get());
            async move { rx.await.unwrap() }.boxed()
        }
    }

    fn devices(ids: &[i64]) -> Value {
        Value::Array(
            ids.iter()
                .map(|id| json!({ "id": id, "name": format!("dev{id}"), "ip_address": "10.0.0.1", "status": "Up" }))
                .collect(),
        )
    }

    fn setup(ordering: ResponseOrdering) -> (ManualSource, PullDriver<ManualSource>, Dashboard<MemorySink>) {
        let source = ManualSource::default();
        let driver = PullDriver::new(source.clone(), DeviceCount::default()).with_ordering(ordering);
        (source, driver, Dashboard::new(MemorySink::new()))
    }

    async fn pump(driver: &mut PullDriver<ManualSource>, dash: &mut Dashboard<MemorySink>) {
        let event = driver.next_event().await;
        driver.apply(event, dash);
    }

    fn visible_ids(dash: &Dashboard<MemorySink>) -> Vec<i64> {
        dash.sink().rows.iter().map(|d| d.id.unwrap().get()).collect()
    }

    #[tokio::test]
    async fn initial_load_success() {
        let (source, mut driver, mut dash) = setup(ResponseOrdering::Arrival);
        driver.start(&mut dash);
        assert_eq!(dash.sink().sync_state, Some(SyncState::Loading));
        assert_eq!(dash.sink().requested, Some(DeviceCount::default()));
        assert!(driver.is_busy());

        source.take_reply().send(Ok(devices(&[2, 1]))).unwrap();
        pump(&mut driver, &mut dash).await;

        assert!(!driver.is_busy());
        assert_eq!(dash.sink().sync_state, Some(SyncState::Ready));
        assert_eq!(visible_ids(&dash), vec![1, 2]);
        assert!(dash.sink().last_updated.is_some());
    }

    #[tokio::test]
    async fn empty_array_is_empty_state() {
        let (source, mut driver, mut dash) = setup(ResponseOrdering::Arrival);
        driver.start(&mut dash);
        source.take_reply().send(Ok(json!([]))).unwrap();
        pump(&mut driver, &mut dash).await;
        assert_eq!(dash.sink().sync_state, Some(SyncState::Empty));
    }

    #[tokio::test]
    async fn initial_failure_has_no_toast() {
        let (source, mut driver, mut dash) = setup(ResponseOrdering::Arrival);
        driver.start(&mut dash);
        source
            .take_reply()
            .send(Err(CoreError::Http { status: 500 }))
            .unwrap();
        pump(&mut driver, &mut dash).await;

        assert_eq!(
            dash.sink().sync_state,
            Some(SyncState::Error("Failed to load devices: HTTP 500".into()))
        );
        assert!(dash.sink().errors.is_empty());
    }

    #[tokio::test]
    async fn refresh_failure_keeps_data_and_toasts() {
        let (source, mut driver, mut dash) = setup(ResponseOrdering::Arrival);
        driver.start(&mut dash);
        source.take_reply().send(Ok(devices(&[1, 2]))).unwrap();
        pump(&mut driver, &mut dash).await;

        driver.refresh(&mut dash);
        source
            .take_reply()
            .send(Err(CoreError::Http { status: 503 }))
            .unwrap();
        pump(&mut driver, &mut dash).await;

        assert_eq!(dash.store().len(), 2);
        assert_eq!(
            dash.sink().errors,
            vec!["Couldn't refresh devices: HTTP 503".to_owned()]
        );
        assert!(dash.sink().sync_state.as_ref().unwrap().is_error());
    }

    #[tokio::test]
    async fn count_change_requests_new_count() {
        let (source, mut driver, mut dash) = setup(ResponseOrdering::Arrival);
        driver.start(&mut dash);
        driver.set_count(DeviceCount::parse("501"), &mut dash);

        assert_eq!(*source.requested.lock().unwrap(), vec![10, 500]);
        assert_eq!(driver.count().get(), 500);
        assert_eq!(dash.sink().requested.map(DeviceCount::get), Some(500));
        assert_eq!(driver.in_flight(), 2);
    }

    #[tokio::test]
    async fn arrival_order_lets_last_arrival_win() {
        let (source, mut driver, mut dash) = setup(ResponseOrdering::Arrival);
        driver.start(&mut dash);
        driver.refresh(&mut dash);
        let first = source.take_reply();
        let second = source.take_reply();

        second.send(Ok(devices(&[2]))).unwrap();
        pump(&mut driver, &mut dash).await;
        first.send(Ok(devices(&[1]))).unwrap();
        pump(&mut driver, &mut dash).await;

        assert_eq!(visible_ids(&dash), vec![1]);
    }

    #[tokio::test]
    async fn issue_order_discards_stale_completion() {
        let (source, mut driver, mut dash) = setup(ResponseOrdering::Issue);
        driver.start(&mut dash);
        driver.refresh(&mut dash);
        let first = source.take_reply();
        let second = source.take_reply();

        second.send(Ok(devices(&[2]))).unwrap();
        pump(&mut driver, &mut dash).await;
        first.send(Ok(devices(&[1]))).unwrap();
        pump(&mut driver, &mut dash).await;

        assert_eq!(visible_ids(&dash), vec![2]);
        assert!(!driver.is_busy());
    }

    #[test]
    fn idle_driver_never_resolves() {
        let (_source, mut driver, _dash) = setup(ResponseOrdering::Arrival);
        let mut next = task::spawn(driver.next_event());
        assert_pending!(next.poll());
        assert_pending!(next.poll());
    }
}
