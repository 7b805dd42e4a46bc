// ── Payload classification ──
//
// Raw JSON from the snapshot endpoint or the push channel is decided
// exactly once here. Everything past this boundary works with typed
// records; malformed input never propagates as an error.

use serde_json::Value;

use crate::model::{DevicePatch, DeviceRecord};

/// Shape of one push message.
#[derive(Debug, Clone, PartialEq)]
pub enum PushPayload {
    /// A full device list: replaces the collection.
    Snapshot(Vec<DeviceRecord>),
    /// One device's changed fields: merged by id.
    Delta(DevicePatch),
    /// Anything else. Ignored.
    Unrecognized,
}

impl PushPayload {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Snapshot(records_from_items(items)),
            Value::Object(map) if map.contains_key("id") => {
                match serde_json::from_value::<DevicePatch>(Value::Object(map)) {
                    Ok(patch) => Self::Delta(patch),
                    Err(e) => {
                        tracing::debug!(error = %e, "ignoring delta with invalid id");
                        Self::Unrecognized
                    }
                }
            }
            other => {
                tracing::debug!(kind = value_kind(&other), "ignoring unrecognized push payload");
                Self::Unrecognized
            }
        }
    }
}

/// Decode a snapshot response body.
///
/// A non-array body is an empty collection. An array keeps every element,
/// in order, whatever shape its id has.
pub fn snapshot_records(body: Value) -> Vec<DeviceRecord> {
    match body {
        Value::Array(items) => records_from_items(items),
        other => {
            tracing::debug!(kind = value_kind(&other), "snapshot body is not an array");
            Vec::new()
        }
    }
}

fn records_from_items(items: Vec<Value>) -> Vec<DeviceRecord> {
    items.into_iter().map(DeviceRecord::from_value).collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
