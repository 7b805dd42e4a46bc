// ── Device domain types ──
//
// One monitored device row plus the partial update shape that push
// deltas carry. Both are decoded leniently: string fields accept any
// JSON scalar, ids accept anything that prints as an integer, and
// unknown fields are kept in `extra` so they survive merges untouched.

use std::fmt;

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Stable integer identity of a device.
///
/// Decodes from a JSON integer, an integral float (`4.0`) or a string in
/// canonical decimal form (`"3"`, not `"03"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceId(i64);

impl DeviceId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for DeviceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl DeviceId {
    /// Interpret a raw JSON id. `None` when it does not name an integer.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => from_number(n),
            Value::String(s) => s
                .parse::<i64>()
                .ok()
                .filter(|n| n.to_string() == *s)
                .map(Self),
            _ => None,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn from_number(n: &Number) -> Option<DeviceId> {
    if let Some(i) = n.as_i64() {
        return Some(DeviceId(i));
    }
    let f = n.as_f64()?;
    // Integral and inside the i64 range: the cast is exact.
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| DeviceId(f as i64))
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| {
            de::Error::invalid_value(Unexpected::Other(&value.to_string()), &"an integer device id")
        })
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monitored network device.
///
/// `name`, `ip_address` and `status` are optional because a delta for an
/// unknown id inserts whatever fields it happens to carry. `id` is
/// optional because a snapshot keeps every element, including ones whose
/// id is missing or not an integer. Such rows are never matched by a delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<DeviceId>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_address: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    /// Any other fields the payload carried.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceRecord {
    /// A record with all display fields set.
    pub fn new(
        id: impl Into<DeviceId>,
        name: impl Into<String>,
        ip_address: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            ip_address: Some(ip_address.into()),
            status: Some(status.into()),
            extra: Map::new(),
        }
    }

    /// Decode one element of a snapshot. Never drops the element: a
    /// non-object becomes a blank row.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            tracing::debug!(%value, "snapshot element is not an object");
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "malformed device record");
            Self::default()
        })
    }

    /// The id as text, empty when the record has none.
    pub fn id_text(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }

    /// Whether the status reads "up", ignoring case.
    pub fn is_up(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("up"))
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn ip_address(&self) -> &str {
        self.ip_address.as_deref().unwrap_or_default()
    }

    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or_default()
    }

    /// Shallow field-level merge: fields present in the patch win, absent
    /// fields keep their current value.
    pub fn apply(&mut self, patch: DevicePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(ip_address) = patch.ip_address {
            self.ip_address = ip_address;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.extra.extend(patch.extra);
    }
}

impl From<DevicePatch> for DeviceRecord {
    /// Insert-on-miss: the new record has exactly the patch's fields.
    fn from(patch: DevicePatch) -> Self {
        Self {
            id: Some(patch.id),
            name: patch.name.flatten(),
            ip_address: patch.ip_address.flatten(),
            status: patch.status.flatten(),
            extra: patch.extra,
        }
    }
}

/// A single-device delta.
///
/// Outer `None` means the field was absent from the payload; `Some(None)`
/// means it was present as `null` and clears the stored value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DevicePatch {
    pub id: DeviceId,
    #[serde(default, deserialize_with = "present_string")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_string")]
    pub ip_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_string")]
    pub status: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DevicePatch {
    /// A patch that only names the device.
    pub fn new(id: impl Into<DeviceId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            ip_address: None,
            status: None,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Some(name.into()));
        self
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(Some(ip.into()));
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(Some(status.into()));
        self
    }
}

// ── Lenient field decoding ───────────────────────────────────────────

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<DeviceId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let id = DeviceId::from_json(&value);
    if id.is_none() && !value.is_null() {
        tracing::debug!(%value, "device id is not an integer");
    }
    Ok(id)
}

/// Scalars become strings, `null` is absent, compound values keep their
/// JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other @ (Value::Array(_) | Value::Object(_)) => Some(other.to_string()),
    })
}

fn present_string<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(Some)
}
