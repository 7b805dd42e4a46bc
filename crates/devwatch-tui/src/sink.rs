//! Presentation sink that turns dashboard output into UI actions.
//!
//! The dashboard runs on the app task and never touches widgets directly;
//! every call here becomes an [`Action`] drained by the main loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::trace;

use devwatch_core::{ConnectionState, DeviceCount, DeviceRecord, PresentationSink, SyncState};

use crate::action::{Action, Notification};

pub struct TuiSink {
    tx: mpsc::UnboundedSender<Action>,
}

impl TuiSink {
    pub fn new(tx: mpsc::UnboundedSender<Action>) -> Self {
        Self { tx }
    }

    fn send(&self, action: Action) {
        // The receiver only goes away during shutdown.
        if self.tx.send(action).is_err() {
            trace!("action channel closed, dropping sink update");
        }
    }
}

impl PresentationSink for TuiSink {
    fn set_sync_state(&mut self, state: SyncState) {
        self.send(Action::SyncStateChanged(state));
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        self.send(Action::ConnectionChanged(state));
    }

    fn render_rows(&mut self, rows: &[DeviceRecord]) {
        self.send(Action::RowsUpdated(Arc::new(rows.to_vec())));
    }

    fn set_count(&mut self, visible: usize) {
        self.send(Action::VisibleCount(visible));
    }

    fn set_requested_count(&mut self, count: DeviceCount) {
        self.send(Action::RequestedCount(count));
    }

    fn set_last_updated(&mut self, at: DateTime<Utc>) {
        self.send(Action::LastUpdated(at));
    }

    fn report_error(&mut self, message: &str) {
        self.send(Action::Notify(Notification::error(message)));
    }
}
