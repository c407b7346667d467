//! Quote API clients used by the extract stage.
//!
//! [`QuoteProvider`] is the seam between the pipeline and a market data
//! vendor. A provider performs exactly one request per call, classifies
//! failures into [`ProviderError`] and never retries.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use intraday_etl::models::raw::RawArtifact;
//! use intraday_etl::providers::{IntradayRequest, ProviderError, QuoteProvider};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl QuoteProvider for Canned {
//!     async fn fetch_intraday(
//!         &self,
//!         _request: &IntradayRequest,
//!     ) -> Result<RawArtifact, ProviderError> {
//!         Ok(RawArtifact::default())
//!     }
//! }
//! ```

pub mod alpha_vantage;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, IntoError, Snafu};

use crate::config::ApiSettings;
use crate::models::{interval::Interval, raw::RawArtifact};

/// One intraday series request: a single symbol at a single interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntradayRequest {
    pub symbol: String,
    pub interval: Interval,
}

impl IntradayRequest {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
        }
    }

    pub fn from_settings(api: &ApiSettings) -> Self {
        Self::new(api.symbol.trim(), api.interval)
    }
}

/// Trait for fetching one intraday series from a quote vendor.
///
/// Implementations return the response body unchanged once it has passed the
/// vendor's error and structure checks.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_intraday(&self, request: &IntradayRequest)
    -> Result<RawArtifact, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing API key: {source}"))]
    MissingApiKey {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `QuoteProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// No response within the configured timeout.
    #[snafu(display("Request timed out: {source}"))]
    Timeout {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The endpoint could not be reached.
    #[snafu(display("A connection error occurred: {source}"))]
    Connection {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Any other transport failure.
    #[snafu(display("API request failed: {source}"))]
    Request {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The server answered with a non-success status.
    #[snafu(display("HTTP error occurred: {status}: {body}"))]
    Http {
        status: u16,
        body: String,
        backtrace: Backtrace,
    },

    /// The body was not a JSON object.
    #[snafu(display("Failed to decode response body: {source}"))]
    Decode {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned a specific error message (e.g., invalid API key).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The response lacks a block the pipeline needs.
    #[snafu(display("Data validation failed: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },
}

/// Maps a transport error onto the timeout / connection / other categories.
pub fn classify(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        TimeoutSnafu.into_error(err)
    } else if err.is_connect() {
        ConnectionSnafu.into_error(err)
    } else {
        RequestSnafu.into_error(err)
    }
}
