// ── Reconciliation engine ──
//
// Owns the canonical device collection and merges snapshots and deltas
// into it.

mod device_store;

pub use device_store::{DeviceStore, MergeOutcome};
