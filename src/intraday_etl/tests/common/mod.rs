#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, NaiveDateTime};
use intraday_etl::config::Settings;
use serde_json::{Value, json};
use tempfile::TempDir;

pub const SERIES_KEY: &str = "Time Series (5min)";

/// A throwaway project layout: config file, data directories and database
/// under one temp dir.
pub struct Workspace {
    pub dir: TempDir, // keep alive for the life of the test
    pub config_path: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config_path = dir.path().join("etl.toml");
        fs::write(
            &config_path,
            r#"
required_fields = ["1. open", "2. high", "3. low", "4. close", "5. volume"]

[api]
symbol = "IBM"
interval = "5min"

[directories]
raw_data = "data/raw_data"
processed_data = "data/processed_data"
diagnostics = "logs/rejections"

[transform]
workers = 2

[database]
url = "data/intraday.db"
"#,
        )
        .expect("write config");
        Self { dir, config_path }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn settings(&self) -> Settings {
        Settings::from_path(&self.config_path).expect("settings")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root().join("data/raw_data")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root().join("data/processed_data")
    }

    pub fn diagnostics_dir(&self) -> PathBuf {
        self.root().join("logs/rejections")
    }

    pub fn write_raw(&self, file_name: &str, body: &Value) -> PathBuf {
        let dir = self.raw_dir();
        fs::create_dir_all(&dir).expect("raw dir");
        let path = dir.join(file_name);
        fs::write(&path, serde_json::to_vec_pretty(body).expect("encode")).expect("write raw");
        path
    }

    pub fn files_in(&self, dir: &Path) -> Vec<String> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn bar(open: &str, high: &str, low: &str, close: &str, volume: &str) -> Value {
    json!({
        "1. open": open,
        "2. high": high,
        "3. low": low,
        "4. close": close,
        "5. volume": volume
    })
}

/// A raw capture shaped like the quote API response.
pub fn raw_response(series: Value) -> Value {
    json!({
        "Meta Data": {
            "1. Information": "Intraday (5min) open, high, low, close prices and volume",
            "2. Symbol": "IBM",
            "4. Interval": "5min"
        },
        SERIES_KEY: series,
        "extraction_time": "20240102_160000"
    })
}

/// Three entries, the last one without a volume.
pub fn three_entries_one_missing_volume() -> Value {
    let mut missing = bar("187.25", "187.75", "187.125", "187.5", "0");
    missing.as_object_mut().unwrap().remove("5. volume");
    raw_response(json!({
        "2024-01-02 15:50:00": bar("186.5", "186.875", "186.25", "186.625", "9100"),
        "2024-01-02 15:55:00": bar("186.625", "187.25", "186.5", "187.125", "12044"),
        "2024-01-02 16:00:00": missing
    }))
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}
