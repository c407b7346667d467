//! Raw API capture as stored in the raw-data directory.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key of the metadata object in a raw response.
pub const META_DATA_KEY: &str = "Meta Data";

/// Key injected by the extract stage with the capture time (`%Y%m%d_%H%M%S`).
pub const EXTRACTION_TIME_KEY: &str = "extraction_time";

/// One `(timestamp-key, field-map)` pair taken from a raw series block.
///
/// The field map is kept as untyped JSON so that malformed entries can be
/// reported verbatim in the rejection log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSeriesEntry {
    pub key: String,
    pub fields: Value,
}

impl RawSeriesEntry {
    pub fn new(key: impl Into<String>, fields: Value) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }
}

/// A parsed raw artifact.
///
/// Only the series block matters to the transform stage; every other top-level
/// key (metadata, extraction stamp, ...) is kept but ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawArtifact {
    body: IndexMap<String, Value>,
}

impl RawArtifact {
    /// Parses the bytes of a raw artifact. The document must be a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.body.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.body.contains_key(key)
    }

    /// Capture time written by the extract stage, if any.
    pub fn extraction_time(&self) -> Option<&str> {
        self.body.get(EXTRACTION_TIME_KEY).and_then(Value::as_str)
    }

    /// Returns the entries of the series block stored under `series_key`.
    ///
    /// `None` when the key is absent, is not an object, or holds no entries.
    pub fn series_entries(&self, series_key: &str) -> Option<Vec<RawSeriesEntry>> {
        match self.body.get(series_key) {
            Some(Value::Object(map)) if !map.is_empty() => Some(
                map.iter()
                    .map(|(key, fields)| RawSeriesEntry::new(key.clone(), fields.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl From<IndexMap<String, Value>> for RawArtifact {
    fn from(body: IndexMap<String, Value>) -> Self {
        Self { body }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_series_entries() {
        let raw = json!({
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (5min)": {
                "2024-01-01 09:30:00": {"1. open": "10.5"},
                "2024-01-01 09:35:00": {"1. open": "10.6"}
            },
            "extraction_time": "20240101_093501"
        });
        let artifact = RawArtifact::from_slice(raw.to_string().as_bytes()).unwrap();

        let entries = artifact.series_entries("Time Series (5min)").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.key == "2024-01-01 09:35:00"));
        assert_eq!(artifact.extraction_time(), Some("20240101_093501"));
    }

    #[test]
    fn absent_empty_or_scalar_block_is_none() {
        let artifact: RawArtifact = serde_json::from_value(json!({
            "Time Series (1min)": {},
            "Time Series (15min)": "oops"
        }))
        .unwrap();

        assert!(artifact.series_entries("Time Series (5min)").is_none());
        assert!(artifact.series_entries("Time Series (1min)").is_none());
        assert!(artifact.series_entries("Time Series (15min)").is_none());
    }

    #[test]
    fn non_object_document_fails_to_parse() {
        assert!(RawArtifact::from_slice(b"[1, 2, 3]").is_err());
        assert!(RawArtifact::from_slice(b"{not json").is_err());
    }
}
