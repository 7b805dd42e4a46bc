// ── Canonical device collection ──
//
// Insertion-ordered map keyed by device id. Records without an id get
// a slot of their own that no delta can address. Every mutation bumps a
// version counter so hosts can tell whether anything changed between
// two reads.

use indexmap::IndexMap;

use crate::model::{DeviceId, DevicePatch, DeviceRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Id(DeviceId),
    /// Position of an id-less record within its snapshot.
    Unkeyed(usize),
}

/// What `merge_one` did with a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// An existing record was updated in place.
    Updated,
    /// No record matched; the patch was appended as a new record.
    Inserted,
}

/// The canonical device collection. Ids are unique.
#[derive(Debug, Default)]
pub struct DeviceStore {
    records: IndexMap<Slot, DeviceRecord>,
    version: u64,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with `records`.
    ///
    /// A repeated id keeps the position of its first occurrence and the
    /// value of its last. Records without an id are all kept.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = DeviceRecord>) {
        self.records.clear();
        let mut duplicates = 0usize;
        for (position, record) in records.into_iter().enumerate() {
            let slot = record.id.map_or(Slot::Unkeyed(position), Slot::Id);
            if self.records.insert(slot, record).is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            tracing::debug!(duplicates, "snapshot contained repeated device ids");
        }
        self.bump_version();
    }

    /// Merge a single-device delta into the collection.
    pub fn merge_one(&mut self, patch: DevicePatch) -> MergeOutcome {
        let slot = Slot::Id(patch.id);
        let outcome = if let Some(existing) = self.records.get_mut(&slot) {
            existing.apply(patch);
            MergeOutcome::Updated
        } else {
            self.records.insert(slot, DeviceRecord::from(patch));
            MergeOutcome::Inserted
        };
        self.bump_version();
        outcome
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.bump_version();
    }

    pub fn get(&self, id: DeviceId) -> Option<&DeviceRecord> {
        self.records.get(&Slot::Id(id))
    }

    /// Records in collection order.
    pub fn records(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mutation counter; starts at zero.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn seeded() -> DeviceStore {
        let mut store = DeviceStore::new();
        store.replace_all([
            DeviceRecord::new(1, "Router1", "192.168.0.1", "Up"),
            DeviceRecord::new(2, "Switch2", "192.168.0.2", "Down"),
        ]);
        store
    }

    fn ids(store: &DeviceStore) -> Vec<i64> {
        store.records().map(|d| d.id.unwrap().get()).collect()
    }

    #[test]
    fn replace_wipes_prior_state() {
        let mut store = seeded();
        store.replace_all([DeviceRecord::new(3, "AP3", "192.168.0.3", "Up")]);
        assert_eq!(ids(&store), vec![3]);
        assert!(store.get(DeviceId::new(1)).is_none());
    }

    #[test]
    fn replace_with_nothing_empties() {
        let mut store = seeded();
        store.replace_all(Vec::new());
        assert!(store.is_empty());
    }

    #[test]
    fn replace_collapses_duplicate_ids() {
        let mut store = DeviceStore::new();
        store.replace_all([
            DeviceRecord::new(1, "Old", "10.0.0.1", "Up"),
            DeviceRecord::new(2, "Switch2", "10.0.0.2", "Up"),
            DeviceRecord::new(1, "New", "10.0.0.1", "Down"),
        ]);
        assert_eq!(ids(&store), vec![1, 2]);
        assert_eq!(store.get(DeviceId::new(1)).unwrap().name(), "New");
    }

    #[test]
    fn replace_keeps_records_without_id_in_order() {
        let mut store = DeviceStore::new();
        store.replace_all([
            DeviceRecord::from_value(serde_json::json!({ "name": "first" })),
            DeviceRecord::new(1, "Router1", "10.0.0.1", "Up"),
            DeviceRecord::from_value(serde_json::json!({ "name": "second" })),
        ]);
        let names: Vec<&str> = store.records().map(DeviceRecord::name).collect();
        assert_eq!(names, vec!["first", "Router1", "second"]);

        // A delta can only address keyed records.
        assert_eq!(
            store.merge_one(DevicePatch::new(2).with_name("Switch2")),
            MergeOutcome::Inserted
        );
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn merge_preserves_unspecified_fields() {
        let mut store = seeded();
        let outcome = store.merge_one(DevicePatch::new(1).with_status("Down"));
        assert_eq!(outcome, MergeOutcome::Updated);
        assert_eq!(
            store.get(DeviceId::new(1)).unwrap(),
            &DeviceRecord::new(1, "Router1", "192.168.0.1", "Down")
        );
        assert_eq!(ids(&store), vec![1, 2]);
    }

    #[test]
    fn merge_inserts_on_miss_at_end() {
        let mut store = seeded();
        let outcome = store.merge_one(DevicePatch::new(9).with_status("Up"));
        assert_eq!(outcome, MergeOutcome::Inserted);
        assert_eq!(ids(&store), vec![1, 2, 9]);

        let inserted = store.get(DeviceId::new(9)).unwrap();
        assert_eq!(inserted.status(), "Up");
        assert_eq!(inserted.name, None);
    }

    #[test]
    fn ids_stay_unique_under_merges() {
        let mut store = seeded();
        for status in ["Down", "Up", "Down"] {
            store.merge_one(DevicePatch::new(2).with_status(status));
            store.merge_one(DevicePatch::new(5).with_status(status));
        }
        assert_eq!(ids(&store), vec![1, 2, 5]);
    }

    #[test]
    fn every_mutation_bumps_version() {
        let mut store = DeviceStore::new();
        assert_eq!(store.version(), 0);
        store.replace_all(Vec::new());
        store.merge_one(DevicePatch::new(1));
        store.clear();
        assert_eq!(store.version(), 3);
        assert!(store.is_empty());
    }
}
