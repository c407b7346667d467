//! Extract stage: one quote API call captured as a raw artifact.

use std::{fs, path::PathBuf};

use chrono::NaiveDateTime;
use serde_json::Value;
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::info;

use crate::config::Settings;
use crate::io::{
    atomic::write_new_file,
    discovery::{ArtifactPattern, STAMP_FORMAT, stamp_now},
};
use crate::models::raw::{EXTRACTION_TIME_KEY, RawArtifact};
use crate::providers::{IntradayRequest, ProviderError, QuoteProvider};

#[derive(Debug, Snafu)]
pub enum ExtractError {
    #[snafu(display("Failed to fetch intraday data: {source}"))]
    Fetch {
        #[snafu(backtrace)]
        source: ProviderError,
    },

    #[snafu(display("Failed to create directory {}: {source}", path.display()))]
    CreateRawDir {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to encode raw artifact: {source}"))]
    EncodeRaw {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to save raw artifact {}: {source}", path.display()))]
    SaveRaw {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub raw_artifact: PathBuf,
    pub extraction_time: String,
    pub entries: usize,
}

/// Fetches the configured series and saves it to the raw-data directory.
pub async fn extract(
    provider: &dyn QuoteProvider,
    settings: &Settings,
) -> Result<ExtractSummary, ExtractError> {
    let request = IntradayRequest::from_settings(&settings.api);
    let at = stamp_now();

    let artifact = provider.fetch_intraday(&request).await.context(FetchSnafu)?;
    let entries = artifact
        .series_entries(&request.interval.series_key())
        .map_or(0, |entries| entries.len());

    let raw_artifact = save_raw_artifact(artifact, settings, at)?;
    info!(
        artifact = %raw_artifact.display(),
        symbol = %request.symbol,
        entries,
        "data extracted and saved"
    );

    Ok(ExtractSummary {
        raw_artifact,
        extraction_time: at.format(STAMP_FORMAT).to_string(),
        entries,
    })
}

/// Stamps `artifact` with `extraction_time` and writes it as
/// `data_<stamp>.json`.
pub fn save_raw_artifact(
    mut artifact: RawArtifact,
    settings: &Settings,
    at: NaiveDateTime,
) -> Result<PathBuf, ExtractError> {
    let dir = &settings.directories.raw_data;
    fs::create_dir_all(dir).context(CreateRawDirSnafu { path: dir })?;

    artifact.insert(
        EXTRACTION_TIME_KEY,
        Value::String(at.format(STAMP_FORMAT).to_string()),
    );
    let body = serde_json::to_vec(&artifact).context(EncodeRawSnafu)?;

    let file_name = ArtifactPattern::raw().file_name(at, None);
    write_new_file(dir, &file_name, &body).context(SaveRawSnafu {
        path: dir.join(&file_name),
    })
}
