//! Load stage: bulk-inserts the newest processed artifact into
//! `intraday_data`.
//!
//! Rows are keyed by `timestamp`. A row whose timestamp is already stored is
//! skipped and counted as a duplicate, so loading the same artifact twice is
//! harmless.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::info;

use crate::config::Settings;
use crate::db::{DbError, connection::connect_sqlite, migrate, sqlite_path};
use crate::io::discovery::{ArtifactPattern, DiscoveryError, find_latest};
use crate::models::record::NormalizedRecord;
use crate::schema::intraday_data;

#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display("No processed data to load: {source}"))]
    NoProcessedData {
        source: DiscoveryError,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to read processed artifact {}: {source}", path.display()))]
    ReadProcessed {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Malformed processed artifact {}: {source}", path.display()))]
    ParseProcessed {
        path: PathBuf,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to create database directory {}: {source}", path.display()))]
    CreateDbDir {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("{source}"))]
    Database {
        #[snafu(backtrace)]
        source: DbError,
    },

    #[snafu(display("Failed to insert records: {source}"))]
    Insert {
        source: diesel::result::Error,
        backtrace: Backtrace,
    },
}

#[derive(Insertable, Debug)]
#[diesel(table_name = intraday_data)]
struct NewRow {
    timestamp: NaiveDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    created_at: NaiveDateTime,
}

/// A row of `intraday_data` as stored.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = intraday_data)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StoredRecord {
    pub id: i32,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub processed_artifact: PathBuf,
    pub read: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

/// Parses a processed artifact (a JSON array of records).
pub fn read_processed_artifact(path: &Path) -> Result<Vec<NormalizedRecord>, LoadError> {
    let bytes = fs::read(path).context(ReadProcessedSnafu { path })?;
    serde_json::from_slice(&bytes).context(ParseProcessedSnafu { path })
}

/// Inserts `records` in one transaction, skipping timestamps already stored.
///
/// Returns the number of rows actually inserted.
pub fn insert_records(
    conn: &mut SqliteConnection,
    records: &[NormalizedRecord],
    created_at: NaiveDateTime,
) -> QueryResult<usize> {
    conn.immediate_transaction(|conn| {
        let mut inserted = 0;
        for record in records {
            let row = NewRow {
                timestamp: record.timestamp,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
                created_at,
            };
            inserted += diesel::insert_or_ignore_into(intraday_data::table)
                .values(&row)
                .execute(conn)?;
        }
        Ok(inserted)
    })
}

/// Loads the newest processed artifact into the configured database.
pub fn load_latest(settings: &Settings) -> Result<LoadSummary, LoadError> {
    let path = find_latest(
        &settings.directories.processed_data,
        &ArtifactPattern::processed(),
    )
    .context(NoProcessedDataSnafu)?;
    let records = read_processed_artifact(&path)?;

    let db_path = Path::new(sqlite_path(&settings.database.url));
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(CreateDbDirSnafu { path: parent })?;
    }
    let mut conn = connect_sqlite(&settings.database.url).context(DatabaseSnafu)?;
    migrate::apply(&mut conn).context(DatabaseSnafu)?;

    let inserted =
        insert_records(&mut conn, &records, Utc::now().naive_utc()).context(InsertSnafu)?;

    let summary = LoadSummary {
        processed_artifact: path,
        read: records.len(),
        inserted,
        duplicates: records.len() - inserted,
    };
    info!(
        artifact = %summary.processed_artifact.display(),
        read = summary.read,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "data loaded"
    );
    Ok(summary)
}

/// Reads every stored row ordered by timestamp.
pub fn stored_records(conn: &mut SqliteConnection) -> QueryResult<Vec<StoredRecord>> {
    intraday_data::table
        .order(intraday_data::timestamp.asc())
        .select(StoredRecord::as_select())
        .load(conn)
}
