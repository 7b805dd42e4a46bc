//! Reconciliation and view layer between `devwatch-api` and the
//! presentation binaries (CLI / TUI).
//!
//! - **[`DeviceStore`]**: the canonical device collection. Full snapshots
//!   replace it, single-device deltas merge into it field by field, ids stay
//!   unique.
//!
//! - **[`project`]**: pure filter → sort projection of the collection under
//!   a [`ViewState`] (text query, status filter, sort key and direction).
//!
//! - **[`Dashboard`]**: store + view + a [`PresentationSink`], owned by one
//!   task. Every mutation recomputes the projection and pushes rows, visible
//!   count, and `ready`/`empty` state to the sink.
//!
//! - **Sync drivers** ([`sync`]): [`PullDriver`] issues on-demand snapshot
//!   requests; [`PushDriver`] keeps a push subscription and seeds itself with
//!   snapshot requests. Both expose `next_event()` for the host's `select!`
//!   loop and `apply()` to fold events into the dashboard.
//!
//! - **[`PushPayload`]**: raw push messages classified once into
//!   snapshot, delta, or unrecognized.

pub mod dashboard;
pub mod error;
pub mod model;
pub mod payload;
pub mod store;
pub mod sync;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use model::{DeviceCount, DeviceId, DevicePatch, DeviceRecord};
pub use payload::{PushPayload, snapshot_records};
pub use store::{DeviceStore, MergeOutcome};
pub use sync::{
    ConnectionState, DriverEvent, DriverOptions, HttpSnapshotSource, LiveDriver, MemorySink,
    PresentationSink, PullDriver, PushDriver, ResponseOrdering, SnapshotOutcome, SnapshotSource,
    SyncDriver, SyncMode, SyncState, Trigger, UpdateSource,
};
pub use view::{SortKey, ViewState, project};
