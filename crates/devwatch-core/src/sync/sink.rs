// ── Presentation sink ──
//
// Everything the core tells a presentation layer. The dashboard calls
// these synchronously after each mutation; implementations must not
// block.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::model::{DeviceCount, DeviceRecord};

/// Data sync state shown by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SyncState {
    Loading,
    Ready,
    Empty,
    Error(String),
}

impl SyncState {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("loading"),
            Self::Ready => f.write_str("ready"),
            Self::Empty => f.write_str("empty"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Push channel connection state. Pull mode never reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    Error,
}

/// Outbound interface from the core to a presentation layer.
pub trait PresentationSink {
    fn set_sync_state(&mut self, state: SyncState);

    fn set_connection_state(&mut self, state: ConnectionState);

    /// Replace the displayed rows with the latest projection.
    fn render_rows(&mut self, rows: &[DeviceRecord]);

    /// Number of visible rows.
    fn set_count(&mut self, visible: usize);

    /// Echo of the normalized requested count.
    fn set_requested_count(&mut self, count: DeviceCount);

    fn set_last_updated(&mut self, at: DateTime<Utc>);

    /// Transient, user-visible error (a toast, a stderr line).
    fn report_error(&mut self, message: &str);
}

// ── In-memory sink ───────────────────────────────────────────────────

/// Keeps the latest value of everything it is told.
///
/// Used by one-shot consumers that read the result after the sync
/// finishes, and by tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySink {
    pub sync_state: Option<SyncState>,
    pub connection_state: Option<ConnectionState>,
    pub rows: Vec<DeviceRecord>,
    pub visible: usize,
    pub requested: Option<DeviceCount>,
    pub last_updated: Option<DateTime<Utc>>,
    pub errors: Vec<String>,
    /// Every sync state in the order it was set.
    pub sync_history: Vec<SyncState>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresentationSink for MemorySink {
    fn set_sync_state(&mut self, state: SyncState) {
        self.sync_history.push(state.clone());
        self.sync_state = Some(state);
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        self.connection_state = Some(state);
    }

    fn render_rows(&mut self, rows: &[DeviceRecord]) {
        self.rows = rows.to_vec();
    }

    fn set_count(&mut self, visible: usize) {
        self.visible = visible;
    }

    fn set_requested_count(&mut self, count: DeviceCount) {
        self.requested = Some(count);
    }

    fn set_last_updated(&mut self, at: DateTime<Utc>) {
        self.last_updated = Some(at);
    }

    fn report_error(&mut self, message: &str) {
        self.errors.push(message.to_owned());
    }
}
