//! Bar interval supported by the intraday quote endpoint.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Invalid interval '{input}': expected one of 1min, 5min, 15min, 30min, 60min")]
    Unsupported { input: String },
}

/// Spacing between two consecutive bars of an intraday series.
///
/// The quote API only serves these five granularities; anything else is
/// rejected when the configuration is parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    OneMinute,
    #[default]
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::ThirtyMinutes => "30min",
            Interval::SixtyMinutes => "60min",
        }
    }

    /// Key of the nested object holding the bars in a raw response,
    /// e.g. `Time Series (5min)`.
    pub fn series_key(&self) -> String {
        format!("Time Series ({})", self.as_str())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1min" | "1m" => Ok(Interval::OneMinute),
            "5min" | "5m" => Ok(Interval::FiveMinutes),
            "15min" | "15m" => Ok(Interval::FifteenMinutes),
            "30min" | "30m" => Ok(Interval::ThirtyMinutes),
            "60min" | "60m" | "1h" => Ok(Interval::SixtyMinutes),
            _ => Err(IntervalError::Unsupported {
                input: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = IntervalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.as_str().to_string()
    }
}
