mod common;

use common::{Workspace, at, three_entries_one_missing_volume};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Integer, Text};
use intraday_etl::{
    db::connection::connect_sqlite,
    io::StagingWriter,
    load::{LoadError, load_latest, stored_records},
    models::record::NormalizedRecord,
    pipeline::TransformPipeline,
};

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}

#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

#[test]
fn transform_then_load_is_idempotent() {
    let ws = Workspace::new();
    ws.write_raw("data_20240102_160000.json", &three_entries_one_missing_volume());
    let settings = ws.settings();
    TransformPipeline::new(&settings).unwrap().run().unwrap();

    let first = load_latest(&settings).unwrap();
    assert_eq!((first.read, first.inserted, first.duplicates), (2, 2, 0));

    let second = load_latest(&settings).unwrap();
    assert_eq!((second.read, second.inserted, second.duplicates), (2, 0, 2));

    let mut conn = connect_sqlite(&settings.database.url).unwrap();
    let rows = stored_records(&mut conn).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].timestamp, at(2024, 1, 2, 15, 50, 0));
    assert_eq!(rows[0].open, 186.5);
    assert_eq!(rows[1].volume, 12044);
}

#[test]
fn loader_picks_the_newest_processed_artifact() {
    let ws = Workspace::new();
    let settings = ws.settings();
    let record = |minute, volume| NormalizedRecord {
        timestamp: at(2024, 1, 2, 10, minute, 0),
        open: 1.5,
        high: 2.5,
        low: 0.5,
        close: 2.25,
        volume,
    };

    let writer = StagingWriter::new(ws.processed_dir());
    writer
        .write_at(&[record(0, 1)], at(2024, 1, 2, 10, 1, 0))
        .unwrap();
    let newest = writer
        .write_at(&[record(5, 2), record(10, 3)], at(2024, 1, 2, 10, 11, 0))
        .unwrap();

    let summary = load_latest(&settings).unwrap();
    assert_eq!(summary.processed_artifact, newest);
    assert_eq!(summary.inserted, 2);
}

#[test]
fn nothing_to_load_is_a_discovery_failure() {
    let ws = Workspace::new();
    let err = load_latest(&ws.settings()).unwrap_err();
    assert!(matches!(err, LoadError::NoProcessedData { .. }));
}

#[test]
fn connection_pragmas_are_applied() {
    let ws = Workspace::new();
    let path = ws.root().join("pragmas.db");
    let mut conn = connect_sqlite(&path.to_string_lossy()).unwrap();

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(&mut conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(&mut conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}
