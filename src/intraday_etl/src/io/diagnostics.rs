//! Plain-text side channel listing the entries rejected in one run.
//!
//! One line per rejection: `<entry key>\t<error description>\t<entry JSON>`.
//! Key and description are written with JSON string escapes (minus the
//! quotes), so control characters in a raw key cannot split a line.

use std::{fmt::Write as _, fs, path::PathBuf};

use chrono::NaiveDateTime;
use snafu::ResultExt;
use tracing::info;

use crate::io::{
    atomic::write_new_file,
    discovery::{ArtifactPattern, RunId, stamp_now},
    sink::{CreateDirSnafu, DataSink, EncodeSnafu, SinkError, WriteSnafu},
};
use crate::models::rejection::RejectionRecord;

#[derive(Debug, Clone)]
pub struct RejectionLog {
    dir: PathBuf,
    pattern: ArtifactPattern,
    run_id: Option<RunId>,
}

impl RejectionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pattern: ArtifactPattern::rejections(),
            run_id: None,
        }
    }

    pub fn with_run_id(mut self, run_id: Option<RunId>) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn write_at(
        &self,
        rejections: &[RejectionRecord],
        at: NaiveDateTime,
    ) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(&self.dir).context(CreateDirSnafu { path: &self.dir })?;

        let mut body = String::new();
        for rejection in rejections {
            let key = escape_field(&rejection.entry.key)?;
            let description = escape_field(&rejection.error_description())?;
            let entry = serde_json::to_string(&rejection.entry.fields).context(EncodeSnafu)?;
            // writing into a String cannot fail
            let _ = writeln!(body, "{key}\t{description}\t{entry}");
        }

        let file_name = self.pattern.file_name(at, self.run_id.as_ref());
        let path = write_new_file(&self.dir, &file_name, body.as_bytes())
            .context(WriteSnafu { path: self.dir.join(&file_name) })?;

        info!(log = %path.display(), rejected = rejections.len(), "rejection log written");
        Ok(path)
    }
}

fn escape_field(text: &str) -> Result<String, SinkError> {
    let quoted = serde_json::to_string(text).context(EncodeSnafu)?;
    Ok(quoted[1..quoted.len() - 1].to_string())
}

impl DataSink<RejectionRecord> for RejectionLog {
    type Output = PathBuf;

    fn write(&self, data: &[RejectionRecord]) -> Result<PathBuf, SinkError> {
        self.write_at(data, stamp_now())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::models::{raw::RawSeriesEntry, rejection::RejectionReason};
    use crate::transform::normalize::normalize_entry;

    #[test]
    fn one_line_per_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let rejections = vec![
            RejectionRecord::new(
                RawSeriesEntry::new("2024-01-02 10:00:00", json!({"1. open": "1"})),
                RejectionReason::MissingFields {
                    missing: vec!["5. volume".into()],
                },
            ),
            RejectionRecord::new(
                RawSeriesEntry::new("2024-01-02 10:05:00", json!("junk")),
                RejectionReason::NotAFieldMap,
            ),
        ];
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 6, 0)
            .unwrap();

        let path = RejectionLog::new(dir.path())
            .write_at(&rejections, at)
            .unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "rejections_20240102_100600.log"
        );

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2024-01-02 10:00:00\tmissing required fields: 5. volume\t{\"1. open\":\"1\"}",
                "2024-01-02 10:05:00\tentry is not a field map\t\"junk\"",
            ]
        );
    }

    #[test]
    fn control_characters_in_keys_stay_on_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let entry = RawSeriesEntry::new(
            "2024-01-02\n10:00\t00",
            json!({"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}),
        );
        let reason = normalize_entry(&entry, &["1. open".to_string()]).unwrap_err();
        assert!(matches!(reason, RejectionReason::InvalidTimestamp { .. }));
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 7, 0)
            .unwrap();

        let path = RejectionLog::new(dir.path())
            .write_at(&[RejectionRecord::new(entry, reason)], at)
            .unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let columns: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0], r"2024-01-02\n10:00\t00");
        assert!(columns[1].starts_with(r"could not parse timestamp '2024-01-02\n10:00\t00'"));
    }
}
