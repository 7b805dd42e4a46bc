// ── View projection engine ──
//
// Turns the canonical collection into the rows a presentation layer
// shows: text query, then status filter, then sort. Pure and
// deterministic; the result is a fresh list the caller owns.

mod filter;
mod sort;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::model::DeviceRecord;

/// Column the rows are ordered by.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortKey {
    #[default]
    Id,
    Name,
    IpAddress,
    Status,
}

/// User-controlled view parameters. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub query: String,
    /// Exact status to keep (case-insensitive); empty keeps all.
    pub status_filter: String,
    pub sort_key: SortKey,
    pub ascending: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            status_filter: String::new(),
            sort_key: SortKey::Id,
            ascending: true,
        }
    }
}

impl ViewState {
    /// Select a sort column. The current column flips direction; a new
    /// column starts ascending.
    pub fn sort_by(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.ascending = !self.ascending;
        } else {
            self.sort_key = key;
            self.ascending = true;
        }
    }

    /// Project `records` through this view.
    pub fn project<'a>(&self, records: impl IntoIterator<Item = &'a DeviceRecord>) -> Vec<DeviceRecord> {
        project(records, self)
    }
}

/// Filter and sort `records` under `view`.
pub fn project<'a>(
    records: impl IntoIterator<Item = &'a DeviceRecord>,
    view: &ViewState,
) -> Vec<DeviceRecord> {
    let needle = view.query.trim().to_lowercase();
    let wanted = view.status_filter.to_lowercase();

    let mut rows: Vec<DeviceRecord> = records
        .into_iter()
        .filter(|d| filter::matches_query(d, &needle) && filter::matches_status(d, &wanted))
        .cloned()
        .collect();

    rows.sort_by(|a, b| sort::compare(a, b, view.sort_key, view.ascending));
    rows
}
