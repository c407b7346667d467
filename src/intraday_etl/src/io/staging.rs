//! Staging writer: persists a validated batch as the processed artifact the
//! load stage picks up.

use std::{fs, path::PathBuf};

use chrono::NaiveDateTime;
use snafu::ResultExt;
use tracing::info;

use crate::io::{
    atomic::write_new_file,
    discovery::{ArtifactPattern, RunId, stamp_now},
    sink::{CreateDirSnafu, DataSink, EncodeSnafu, SinkError, WriteSnafu},
};
use crate::models::record::NormalizedRecord;

/// Writes batches of [`NormalizedRecord`] as JSON arrays named
/// `processed_data_<stamp>[_<run-id>].json`.
#[derive(Debug, Clone)]
pub struct StagingWriter {
    dir: PathBuf,
    pattern: ArtifactPattern,
    run_id: Option<RunId>,
}

impl StagingWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pattern: ArtifactPattern::processed(),
            run_id: None,
        }
    }

    pub fn with_run_id(mut self, run_id: Option<RunId>) -> Self {
        self.run_id = run_id;
        self
    }

    /// Writes `records` with `at` as the name stamp.
    ///
    /// The directory is created if needed. The artifact appears atomically
    /// under its final name, and an existing artifact with the same name is
    /// left untouched (the write fails instead).
    pub fn write_at(
        &self,
        records: &[NormalizedRecord],
        at: NaiveDateTime,
    ) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(&self.dir).context(CreateDirSnafu { path: &self.dir })?;

        let body = serde_json::to_vec_pretty(records).context(EncodeSnafu)?;
        let file_name = self.pattern.file_name(at, self.run_id.as_ref());
        let path = write_new_file(&self.dir, &file_name, &body)
            .context(WriteSnafu { path: self.dir.join(&file_name) })?;

        info!(artifact = %path.display(), records = records.len(), "processed data saved");
        Ok(path)
    }
}

impl DataSink<NormalizedRecord> for StagingWriter {
    type Output = PathBuf;

    fn write(&self, data: &[NormalizedRecord]) -> Result<PathBuf, SinkError> {
        self.write_at(data, stamp_now())
    }
}
