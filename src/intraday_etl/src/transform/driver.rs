//! Parallel transform driver.
//!
//! Fans a batch of raw entries out over a bounded rayon pool, one
//! [`normalize`] call per unit of work, then partitions the results into
//! accepted records and rejections. A single bad entry never fails the batch;
//! only a batch with zero accepted records does.

use std::num::NonZeroUsize;

use rayon::iter::{Either, IntoParallelIterator, ParallelIterator};
use rayon::{ThreadPool, ThreadPoolBuilder};
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::debug;

use crate::models::{
    raw::RawSeriesEntry,
    record::NormalizedRecord,
    rejection::RejectionRecord,
};
use crate::transform::normalize::normalize;

/// The worker pool could not be started.
#[derive(Debug, Snafu)]
#[snafu(display("Failed to start transform worker pool: {source}"))]
pub struct DriverBuildError {
    source: rayon::ThreadPoolBuildError,
    backtrace: Backtrace,
}

/// Every entry of the batch was rejected (or the batch was empty).
///
/// The rejections are kept so the caller can still write them to the
/// diagnostic log.
#[derive(Debug, Snafu)]
#[snafu(display("no valid data processed: all {} entries were rejected", rejections.len()))]
pub struct EmptyBatchError {
    pub rejections: Vec<RejectionRecord>,
    backtrace: Backtrace,
}

/// Accepted records and rejections of one batch.
///
/// Records are sorted by timestamp and rejections by entry key, so the result
/// does not depend on which worker finished first.
#[derive(Debug, Default)]
pub struct TransformOutcome {
    pub records: Vec<NormalizedRecord>,
    pub rejections: Vec<RejectionRecord>,
}

pub struct TransformDriver {
    pool: ThreadPool,
    required_fields: Vec<String>,
}

impl TransformDriver {
    /// Builds a driver with `workers` threads, or one per available core
    /// when `workers` is `None`.
    pub fn new(
        required_fields: Vec<String>,
        workers: Option<NonZeroUsize>,
    ) -> Result<Self, DriverBuildError> {
        let workers = workers
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get);

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("transform-{idx}"))
            .build()
            .context(DriverBuildSnafu)?;

        Ok(Self {
            pool,
            required_fields,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Normalizes every entry of `entries` on the worker pool.
    pub fn transform(
        &self,
        entries: Vec<RawSeriesEntry>,
    ) -> Result<TransformOutcome, EmptyBatchError> {
        let total = entries.len();
        let required = self.required_fields.as_slice();

        let (mut records, mut rejections): (Vec<NormalizedRecord>, Vec<RejectionRecord>) =
            self.pool.install(|| {
                entries
                    .into_par_iter()
                    .map(|entry| match normalize(&entry, required) {
                        Ok(record) => Either::Left(record),
                        Err(reason) => Either::Right(RejectionRecord::new(entry, reason)),
                    })
                    .partition_map(|result| result)
            });

        records.sort_by_key(|record| record.timestamp);
        rejections.sort_by(|a, b| a.entry.key.cmp(&b.entry.key));

        debug!(
            total,
            accepted = records.len(),
            rejected = rejections.len(),
            workers = self.workers(),
            "transform batch finished"
        );

        if records.is_empty() {
            return EmptyBatchSnafu { rejections }.fail();
        }

        Ok(TransformOutcome {
            records,
            rejections,
        })
    }
}
