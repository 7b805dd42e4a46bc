// ── Row ordering ──

use std::cmp::Ordering;

use crate::model::DeviceRecord;

use super::SortKey;

/// Compare two rows under `key` and direction.
///
/// `Id` compares numerically, with id-less records before every id. Text
/// keys compare lower-cased values; an exact tie falls back to ascending
/// id whatever the direction.
pub(crate) fn compare(a: &DeviceRecord, b: &DeviceRecord, key: SortKey, ascending: bool) -> Ordering {
    let ordering = match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Name => text_order(a.name(), b.name()),
        SortKey::IpAddress => text_order(a.ip_address(), b.ip_address()),
        SortKey::Status => text_order(a.status(), b.status()),
    };

    match ordering {
        Ordering::Equal => a.id.cmp(&b.id),
        ord if ascending => ord,
        ord => ord.reverse(),
    }
}

fn text_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
