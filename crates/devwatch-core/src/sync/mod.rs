// ── Sync drivers ──
//
// A driver keeps the dashboard's canonical collection current. It never
// owns the dashboard: the host loop awaits `next_event()` alongside its
// own input and hands each event back through `apply()`, which runs the
// reconciliation and projection synchronously.

mod live;
mod pull;
mod push;
mod sink;
mod source;

use std::future::Future;

use devwatch_api::ChannelEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::dashboard::Dashboard;
use crate::error::CoreError;
use crate::model::DeviceCount;

pub use live::{DriverOptions, LiveDriver};
pub use pull::PullDriver;
pub use push::PushDriver;
pub use sink::{ConnectionState, MemorySink, PresentationSink, SyncState};
pub use source::{HttpSnapshotSource, SnapshotSource, UpdateSource};

/// How the dashboard learns about device changes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SyncMode {
    /// On-demand snapshot requests.
    #[default]
    Pull,
    /// A push subscription, seeded by one snapshot request.
    Push,
}

/// Which snapshot completions get applied.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ResponseOrdering {
    /// Every completion is applied as it arrives; the last to arrive wins.
    #[default]
    Arrival,
    /// Completions older than one already applied are discarded.
    Issue,
}

/// Why a snapshot request was issued. Decides how a failure reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// First load in pull mode.
    Initial,
    /// User asked for a refresh.
    Manual,
    /// The requested count changed.
    CountChanged,
    /// Push mode seeding, on start and on count change.
    Seed,
}

impl Trigger {
    pub fn failure_prefix(self) -> &'static str {
        match self {
            Self::Seed => "Initial fetch failed",
            Self::Initial | Self::Manual | Self::CountChanged => "Failed to load devices",
        }
    }

    /// Whether a failure also raises a transient notification.
    pub fn raises_toast(self) -> bool {
        matches!(self, Self::Manual | Self::CountChanged)
    }
}

/// A finished snapshot request.
#[derive(Debug)]
pub struct SnapshotOutcome {
    /// Issue order, starting at zero per driver.
    pub seq: u64,
    pub trigger: Trigger,
    pub result: Result<Value, CoreError>,
}

/// Something a driver needs applied to the dashboard.
#[derive(Debug)]
pub enum DriverEvent {
    Snapshot(SnapshotOutcome),
    Channel(ChannelEvent),
}

/// Keeps a dashboard in sync with a device source.
pub trait SyncDriver {
    fn mode(&self) -> SyncMode;

    /// The normalized count the driver requests.
    fn count(&self) -> DeviceCount;

    /// Kick off the initial load.
    fn start<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>);

    /// Issue a new snapshot request, even if one is already in flight.
    fn refresh<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>);

    fn set_count<S: PresentationSink>(&mut self, count: DeviceCount, dashboard: &mut Dashboard<S>);

    /// Empty the table.
    fn clear<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>) {
        dashboard.clear();
    }

    /// `true` while snapshot requests are outstanding.
    fn is_busy(&self) -> bool;

    /// Wait for the next event. Never resolves while there is nothing to
    /// wait for, so it is safe to `select!` on in a loop.
    fn next_event(&mut self) -> impl Future<Output = DriverEvent> + Send;

    fn apply<S: PresentationSink>(&mut self, event: DriverEvent, dashboard: &mut Dashboard<S>);
}
