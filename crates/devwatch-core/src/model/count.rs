// ── Requested device count ──
//
// The `n` parameter shared by snapshot requests and push subscriptions.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A device count, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u16")]
pub struct DeviceCount(u16);

impl DeviceCount {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 500;
    pub const DEFAULT: u16 = 10;

    /// Clamp any integer into range.
    pub fn clamped(n: i64) -> Self {
        let clamped = n.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        Self(u16::try_from(clamped).unwrap_or(Self::DEFAULT))
    }

    /// Parse free-form user input.
    ///
    /// Reads a leading integer (after leading whitespace, with an optional
    /// sign) and stops at the first non-digit. No digits at all yields the
    /// default; anything else is clamped.
    pub fn parse(input: &str) -> Self {
        leading_integer(input).map_or_else(Self::default, Self::clamped)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// Step by `delta`, staying in range.
    pub fn step(self, delta: i64) -> Self {
        Self::clamped(i64::from(self.0).saturating_add(delta))
    }
}

impl Default for DeviceCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<i64> for DeviceCount {
    fn from(n: i64) -> Self {
        Self::clamped(n)
    }
}

impl From<DeviceCount> for u16 {
    fn from(count: DeviceCount) -> Self {
        count.0
    }
}

impl FromStr for DeviceCount {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for DeviceCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Leading-integer parse. Saturates instead of overflowing.
fn leading_integer(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
    }

    seen.then_some(if negative { -value } else { value })
}
