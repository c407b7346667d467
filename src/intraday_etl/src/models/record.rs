//! Canonical in-memory representation of one validated intraday bar (OHLCV).
//!
//! Records are produced by the [`normalizer`](crate::transform::normalize) and
//! are the only shape written to the processed artifact and loaded into the
//! database.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format of the timestamp keys inside a raw series block.
pub const RAW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Field labels used by the quote API inside each series entry.
pub const OPEN_FIELD: &str = "1. open";
pub const HIGH_FIELD: &str = "2. high";
pub const LOW_FIELD: &str = "3. low";
pub const CLOSE_FIELD: &str = "4. close";
pub const VOLUME_FIELD: &str = "5. volume";

/// All five labels, in the order the API emits them.
pub const OHLCV_FIELDS: [&str; 5] = [OPEN_FIELD, HIGH_FIELD, LOW_FIELD, CLOSE_FIELD, VOLUME_FIELD];

/// A single validated time-series bar.
///
/// Values are carried exactly as parsed: no rounding, clamping or unit
/// conversion happens between the raw text and these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizedRecord {
    /// Bar timestamp as reported by the API (exchange local time, second precision).
    /// Serialized as an ISO-8601 string, e.g. `2024-01-01T09:30:00`.
    pub timestamp: NaiveDateTime,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Shares traded during the bar interval.
    pub volume: i64,
}
