// ── Filter predicates for projected rows ──

use crate::model::DeviceRecord;

/// Text query match. `needle` must already be trimmed and lower-cased;
/// an empty needle matches everything.
pub(crate) fn matches_query(record: &DeviceRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.id_text().contains(needle)
        || [record.name(), record.ip_address(), record.status()]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Exact status match. `wanted` must already be lower-cased; an empty
/// filter matches everything. An absent status reads as empty, so only
/// the empty filter keeps it.
pub(crate) fn matches_status(record: &DeviceRecord, wanted: &str) -> bool {
    wanted.is_empty() || record.status().to_lowercase() == wanted
}
