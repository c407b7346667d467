//! Alpha Vantage `TIME_SERIES_INTRADAY` client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use tracing::{debug, error};

use crate::config::ApiSettings;
use crate::models::raw::{META_DATA_KEY, RawArtifact};
use crate::providers::{
    ApiSnafu, ClientBuildSnafu, DecodeSnafu, HttpSnafu, IntradayRequest, MissingApiKeySnafu,
    ProviderError, ProviderInitError, QuoteProvider, ValidationSnafu, classify,
};

const FUNCTION: &str = "TIME_SERIES_INTRADAY";

/// Top-level keys the API uses to report a failed call in a 200 response.
/// `Note` and `Information` carry the rate-limit notice.
const API_ERROR_KEYS: [&str; 4] = ["Error Message", "Note", "Information", "error"];

/// Query string of one intraday call.
#[derive(Debug, Serialize)]
struct IntradayQuery<'a> {
    function: &'static str,
    symbol: &'a str,
    interval: &'static str,
    adjusted: bool,
    apikey: &'a str,
}

pub struct AlphaVantageProvider {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

impl AlphaVantageProvider {
    /// Creates a provider for `api`.
    ///
    /// Reads the API key from the environment variable named by
    /// `api.api_key_env` (`API_KEY` by default).
    pub fn new(api: &ApiSettings) -> Result<Self, ProviderInitError> {
        let api_key = get_env_var(&api.api_key_env).context(MissingApiKeySnafu)?;
        Self::with_api_key(api, SecretString::new(api_key.into()))
    }

    pub fn with_api_key(api: &ApiSettings, api_key: SecretString) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            endpoint: api.endpoint.clone(),
            api_key,
        })
    }

    fn query<'a>(&'a self, request: &'a IntradayRequest) -> IntradayQuery<'a> {
        IntradayQuery {
            function: FUNCTION,
            symbol: &request.symbol,
            interval: request.interval.as_str(),
            adjusted: false,
            apikey: self.api_key.expose_secret(),
        }
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    async fn fetch_intraday(
        &self,
        request: &IntradayRequest,
    ) -> Result<RawArtifact, ProviderError> {
        debug!(symbol = %request.symbol, interval = %request.interval, "requesting intraday series");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(request))
            .send()
            .await
            .map_err(classify)
            .inspect_err(|err| error!(error = %err, "quote request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            error!(status = status.as_u16(), "HTTP error from quote API");
            return HttpSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let body: RawArtifact = response.json().await.context(DecodeSnafu)?;
        check_api_errors(&body)?;
        validate_structure(&body, &request.interval.series_key())?;
        Ok(body)
    }
}

/// Fails when the body carries one of the API's in-band error keys.
pub fn check_api_errors(body: &RawArtifact) -> Result<(), ProviderError> {
    for key in API_ERROR_KEYS {
        if let Some(value) = body.get(key) {
            let message = match value {
                Value::String(text) => format!("{key}: {text}"),
                other => format!("{key}: {other}"),
            };
            error!(%message, "quote API reported an error");
            return ApiSnafu { message }.fail();
        }
    }
    Ok(())
}

/// Requires the metadata block and a non-empty series block.
pub fn validate_structure(body: &RawArtifact, series_key: &str) -> Result<(), ProviderError> {
    for field in [META_DATA_KEY, series_key] {
        let message = match body.get(field) {
            None => format!("required field '{field}' not found"),
            Some(Value::Null) => format!("field '{field}' is null"),
            Some(Value::Object(map)) if map.is_empty() => format!("field '{field}' is empty"),
            Some(Value::Object(_)) => continue,
            Some(_) => format!("field '{field}' is not an object"),
        };
        error!(%message, "quote API response failed validation");
        return ValidationSnafu { message }.fail();
    }
    Ok(())
}
