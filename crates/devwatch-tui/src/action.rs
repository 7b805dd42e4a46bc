//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use devwatch_core::{ConnectionState, DeviceCount, DeviceRecord, SortKey, SyncState, ViewState};

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Every state change in the TUI flows through one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),
    ToggleHelp,

    // ── View (screen → dashboard) ──────────────────────────────
    SetQuery(String),
    CycleStatusFilter,
    SortBy(SortKey),

    // ── Sync (screen → driver) ─────────────────────────────────
    Refresh,
    Clear,
    AdjustCount(i64),
    /// Raw count text from the count editor, normalized by the driver.
    SetCount(String),

    // ── Sink (dashboard → screen) ──────────────────────────────
    RowsUpdated(Arc<Vec<DeviceRecord>>),
    SyncStateChanged(SyncState),
    ConnectionChanged(ConnectionState),
    VisibleCount(usize),
    RequestedCount(DeviceCount),
    LastUpdated(DateTime<Utc>),
    ViewChanged(ViewState),
    /// Whether snapshot requests are outstanding.
    BusyChanged(bool),

    // ── Notifications ──────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
