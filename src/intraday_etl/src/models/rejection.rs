//! Entries dropped by the normalizer and the reason they were dropped.

use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::models::raw::RawSeriesEntry;

/// Why a single series entry could not be normalized.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RejectionReason {
    /// One or more required labels are absent from the field map.
    #[error("missing required fields: {}", missing.join(", "))]
    MissingFields { missing: Vec<String> },

    /// The entry value is not a JSON object.
    #[error("entry is not a field map")]
    NotAFieldMap,

    /// A value needed for coercion is absent (it was not listed as required).
    #[error("field '{field}' is absent")]
    AbsentValue { field: String },

    /// A value is neither a string nor a number.
    #[error("field '{field}' holds a non-scalar value")]
    NonScalarValue { field: String },

    #[error("could not convert '{value}' in field '{field}' to float: {source}")]
    InvalidFloat {
        field: String,
        value: String,
        source: ParseFloatError,
    },

    /// The value parsed, but as NaN or an infinity.
    #[error("field '{field}' holds non-finite value '{value}'")]
    NonFinite { field: String, value: String },

    #[error("could not convert '{value}' in field '{field}' to integer: {source}")]
    InvalidInteger {
        field: String,
        value: String,
        source: ParseIntError,
    },

    #[error("could not parse timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },
}

impl RejectionReason {
    /// True for the presence-check failure; every other variant is a
    /// coercion failure.
    pub fn is_missing_fields(&self) -> bool {
        matches!(self, RejectionReason::MissingFields { .. })
    }
}

/// A rejected entry together with the reason it was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectionRecord {
    pub entry: RawSeriesEntry,
    pub reason: RejectionReason,
}

impl RejectionRecord {
    pub fn new(entry: RawSeriesEntry, reason: RejectionReason) -> Self {
        Self { entry, reason }
    }

    pub fn error_description(&self) -> String {
        self.reason.to_string()
    }
}
