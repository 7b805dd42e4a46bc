// ── Dashboard core ──
//
// The canonical collection, the view parameters, and the sink that
// displays them, owned together and mutated from a single task. Every
// data or view change recomputes the projection and pushes it out.

use chrono::{DateTime, Utc};

use crate::model::{DeviceCount, DevicePatch, DeviceRecord};
use crate::store::{DeviceStore, MergeOutcome};
use crate::sync::{ConnectionState, PresentationSink, SyncState};
use crate::view::{SortKey, ViewState};

/// Reconciliation state plus the presentation sink it feeds.
#[derive(Debug)]
pub struct Dashboard<S> {
    store: DeviceStore,
    view: ViewState,
    sink: S,
}

impl<S: PresentationSink> Dashboard<S> {
    pub fn new(sink: S) -> Self {
        Self::with_view(sink, ViewState::default())
    }

    pub fn with_view(sink: S, view: ViewState) -> Self {
        Self {
            store: DeviceStore::new(),
            view,
            sink,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn store(&self) -> &DeviceStore {
        &self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// The current projection, computed on demand.
    pub fn rows(&self) -> Vec<DeviceRecord> {
        self.view.project(self.store.records())
    }

    // ── View changes ─────────────────────────────────────────────────

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.view.query = query.into();
        self.refresh_view();
    }

    pub fn set_status_filter(&mut self, status: impl Into<String>) {
        self.view.status_filter = status.into();
        self.refresh_view();
    }

    /// Sort by `key`, flipping direction if it is already the sort key.
    pub fn sort_by(&mut self, key: SortKey) {
        self.view.sort_by(key);
        self.refresh_view();
    }

    // ── Data changes ─────────────────────────────────────────────────

    pub fn replace_all(&mut self, records: impl IntoIterator<Item = DeviceRecord>) {
        self.store.replace_all(records);
        self.refresh_view();
    }

    pub fn merge_one(&mut self, patch: DevicePatch) -> MergeOutcome {
        let outcome = self.store.merge_one(patch);
        self.refresh_view();
        outcome
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.refresh_view();
    }

    /// Recompute the projection and push it to the sink.
    ///
    /// Sync state becomes `ready` or `empty` from the projected size
    /// alone, replacing any earlier `loading` or `error`.
    pub fn refresh_view(&mut self) {
        let rows = self.rows();
        tracing::trace!(
            total = self.store.len(),
            visible = rows.len(),
            version = self.store.version(),
            "view recomputed"
        );

        self.sink.render_rows(&rows);
        self.sink.set_count(rows.len());
        self.sink.set_sync_state(if rows.is_empty() {
            SyncState::Empty
        } else {
            SyncState::Ready
        });
    }

    // ── Status reporting ─────────────────────────────────────────────

    pub fn begin_loading(&mut self) {
        self.sink.set_sync_state(SyncState::Loading);
    }

    /// Enter the error state. Data is left as it was.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.sink.set_sync_state(SyncState::Error(message.into()));
    }

    pub fn report_error(&mut self, message: &str) {
        self.sink.report_error(message);
    }

    pub fn set_connection_state(&mut self, state: ConnectionState) {
        self.sink.set_connection_state(state);
    }

    pub fn mark_updated(&mut self, at: DateTime<Utc>) {
        self.sink.set_last_updated(at);
    }

    pub fn echo_count(&mut self, count: DeviceCount) {
        self.sink.set_requested_count(count);
    }
}
