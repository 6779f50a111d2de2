//! Timestamp and display-time utilities
//!
//! The playback timer counts in tenths of a second. [`DisplayTime`] stores that
//! count as a signed integer so that long-running rest timers never pick up
//! floating point drift and render identically on every tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Timer readout in tenths of a second
///
/// Negative values are legal: a rest countdown keeps running past zero until
/// the user advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayTime(i64);

impl DisplayTime {
    pub const ZERO: DisplayTime = DisplayTime(0);

    pub const fn from_tenths(tenths: i64) -> Self {
        DisplayTime(tenths)
    }

    pub const fn tenths(self) -> i64 {
        self.0
    }

    /// Round a duration to the nearest tenth of a second
    pub fn from_duration(duration: Duration) -> Self {
        let tenths = (duration.as_millis() + 50) / 100;
        DisplayTime(i64::try_from(tenths).unwrap_or(i64::MAX))
    }

    /// Shift by a signed number of tenths (saturating)
    pub fn offset(self, tenths: i64) -> Self {
        DisplayTime(self.0.saturating_add(tenths))
    }
}

/// Formats with exactly one decimal place (`12.3`, `0.0`, `-0.4`)
impl fmt::Display for DisplayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}
