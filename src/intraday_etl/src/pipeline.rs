//! Transform-stage orchestrator.
//!
//! One run walks a linear state machine and stops at the first failure:
//!
//! ```text
//! START → DISCOVER_RAW → PARSE_RAW → EXTRACT_SERIES → TRANSFORM
//!       → CHECK_NONEMPTY → STAGE_WRITE → DONE
//! ```
//!
//! Every state can end the run in `FAILED(reason)`; see [`FailureReason`].
//! Nothing is retried inside a run. Per-record problems never reach this
//! level: the [`TransformDriver`] turns them into rejections.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::io::{
    diagnostics::RejectionLog,
    discovery::{ArtifactPattern, DiscoveryError, RunId, find_latest, stamp_now},
    sink::SinkError,
    staging::StagingWriter,
};
use crate::models::{raw::RawArtifact, rejection::RejectionRecord};
use crate::transform::{DriverBuildError, EmptyBatchError, TransformDriver};

/// States of one transform run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    DiscoverRaw,
    ParseRaw,
    ExtractSeries,
    Transform,
    CheckNonEmpty,
    StageWrite,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Start => "START",
            Stage::DiscoverRaw => "DISCOVER_RAW",
            Stage::ParseRaw => "PARSE_RAW",
            Stage::ExtractSeries => "EXTRACT_SERIES",
            Stage::Transform => "TRANSFORM",
            Stage::CheckNonEmpty => "CHECK_NONEMPTY",
            Stage::StageWrite => "STAGE_WRITE",
            Stage::Done => "DONE",
        })
    }
}

/// Tag attached to a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    NoRawData,
    MalformedRaw,
    MissingSeriesBlock,
    NoValidData,
    PersistFailed,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NoRawData => "no raw data files found",
            FailureReason::MalformedRaw => "malformed raw artifact",
            FailureReason::MissingSeriesBlock => "missing time series block",
            FailureReason::NoValidData => "no valid data processed",
            FailureReason::PersistFailed => "could not persist processed artifact",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
pub enum PipelineError {
    #[snafu(display("no raw data files found: {source}"))]
    NoRawData {
        source: DiscoveryError,
        backtrace: Backtrace,
    },

    #[snafu(display("malformed raw artifact {}: {source}", path.display()))]
    ReadRaw {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("malformed raw artifact {}: {source}", path.display()))]
    ParseRaw {
        path: PathBuf,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("missing time series block: '{series_key}' absent or empty in {}", path.display()))]
    MissingSeries {
        path: PathBuf,
        series_key: String,
        backtrace: Backtrace,
    },

    #[snafu(display("{source}"))]
    NoValidData {
        #[snafu(backtrace)]
        source: EmptyBatchError,
    },

    #[snafu(display("could not persist processed artifact: {source}"))]
    Persist {
        #[snafu(backtrace)]
        source: SinkError,
    },
}

impl PipelineError {
    pub fn reason(&self) -> FailureReason {
        match self {
            PipelineError::NoRawData { .. } => FailureReason::NoRawData,
            PipelineError::ReadRaw { .. } | PipelineError::ParseRaw { .. } => {
                FailureReason::MalformedRaw
            }
            PipelineError::MissingSeries { .. } => FailureReason::MissingSeriesBlock,
            PipelineError::NoValidData { .. } => FailureReason::NoValidData,
            PipelineError::Persist { .. } => FailureReason::PersistFailed,
        }
    }

    /// The state the run was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::NoRawData { .. } => Stage::DiscoverRaw,
            PipelineError::ReadRaw { .. } | PipelineError::ParseRaw { .. } => Stage::ParseRaw,
            PipelineError::MissingSeries { .. } => Stage::ExtractSeries,
            PipelineError::NoValidData { .. } => Stage::CheckNonEmpty,
            PipelineError::Persist { .. } => Stage::StageWrite,
        }
    }
}

/// Outcome of a run that reached `DONE`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub raw_artifact: PathBuf,
    pub processed_artifact: PathBuf,
    pub accepted: usize,
    pub rejected: usize,
    /// Rejection log, when a diagnostics directory is configured and at
    /// least one entry was rejected.
    pub rejection_log: Option<PathBuf>,
    /// `extraction_time` stamp carried by the raw artifact, if present.
    pub extraction_time: Option<String>,
}

/// Runs the raw → processed handoff for one configuration.
pub struct TransformPipeline<'a> {
    settings: &'a Settings,
    driver: TransformDriver,
    run_id: Option<RunId>,
}

impl<'a> TransformPipeline<'a> {
    pub fn new(settings: &'a Settings) -> Result<Self, DriverBuildError> {
        let driver = TransformDriver::new(settings.required_fields.clone(), settings.workers())?;
        Ok(Self {
            settings,
            driver,
            run_id: None,
        })
    }

    /// Tags the artifacts of this run so concurrent runs within the same
    /// second do not collide.
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Executes one run stamped with the current UTC time and logs one
    /// summary line for the terminal state.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        self.run_at(stamp_now())
    }

    /// Same as [`run`](Self::run) with an explicit stamp for the output names.
    pub fn run_at(&self, at: NaiveDateTime) -> Result<RunSummary, PipelineError> {
        match self.execute(at) {
            Ok(summary) => {
                info!(
                    state = %Stage::Done,
                    accepted = summary.accepted,
                    rejected = summary.rejected,
                    artifact = %summary.processed_artifact.display(),
                    "transform run finished"
                );
                Ok(summary)
            }
            Err(err) => {
                error!(
                    state = "FAILED",
                    stage = %err.stage(),
                    reason = %err.reason(),
                    cause = %err,
                    "transform run failed"
                );
                Err(err)
            }
        }
    }

    fn execute(&self, at: NaiveDateTime) -> Result<RunSummary, PipelineError> {
        let dirs = &self.settings.directories;

        debug!(state = %Stage::DiscoverRaw, dir = %dirs.raw_data.display());
        let raw_path = find_latest(&dirs.raw_data, &ArtifactPattern::raw()).context(NoRawDataSnafu)?;

        debug!(state = %Stage::ParseRaw, artifact = %raw_path.display());
        let artifact = read_raw_artifact(&raw_path)?;

        let series_key = self.settings.series_key();
        debug!(state = %Stage::ExtractSeries, %series_key);
        let entries = artifact
            .series_entries(&series_key)
            .ok_or_else(|| {
                MissingSeriesSnafu {
                    path: &raw_path,
                    series_key: &series_key,
                }
                .build()
            })?;

        debug!(state = %Stage::Transform, entries = entries.len(), workers = self.driver.workers());
        let outcome = match self.driver.transform(entries) {
            Ok(outcome) => outcome,
            Err(empty) => {
                self.write_rejections(&empty.rejections, at);
                return Err(empty).context(NoValidDataSnafu);
            }
        };
        debug!(state = %Stage::CheckNonEmpty, accepted = outcome.records.len());

        debug!(state = %Stage::StageWrite, dir = %dirs.processed_data.display());
        let processed_artifact = StagingWriter::new(&dirs.processed_data)
            .with_run_id(self.run_id.clone())
            .write_at(&outcome.records, at)
            .context(PersistSnafu)?;

        let rejection_log = self.write_rejections(&outcome.rejections, at);

        Ok(RunSummary {
            raw_artifact: raw_path,
            processed_artifact,
            accepted: outcome.records.len(),
            rejected: outcome.rejections.len(),
            rejection_log,
            extraction_time: artifact.extraction_time().map(str::to_owned),
        })
    }

    /// Best effort: a failing side channel is logged and never fails the run.
    fn write_rejections(&self, rejections: &[RejectionRecord], at: NaiveDateTime) -> Option<PathBuf> {
        let dir = self.settings.directories.diagnostics.as_ref()?;
        if rejections.is_empty() {
            return None;
        }
        match RejectionLog::new(dir)
            .with_run_id(self.run_id.clone())
            .write_at(rejections, at)
        {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(error = %err, "could not write rejection log");
                None
            }
        }
    }
}

fn read_raw_artifact(path: &Path) -> Result<RawArtifact, PipelineError> {
    let bytes = fs::read(path).context(ReadRawSnafu { path })?;
    RawArtifact::from_slice(&bytes).context(ParseRawSnafu { path })
}
