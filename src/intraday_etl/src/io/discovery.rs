//! Artifact naming convention and "most recent artifact" discovery.
//!
//! Artifacts are named `<prefix><YYYYMMDD_HHMMSS>[_<run-id>].<ext>`, e.g.
//! `data_20240102_093501.json` or `processed_data_20240102_093512_nightly.json`.
//!
//! Each [`ArtifactPattern`] carries exactly one [`Recency`] strategy:
//! - [`Recency::FilenameStamp`]: only names with a parseable stamp match, and
//!   the stamp decides. Filesystem times are never consulted.
//! - [`Recency::ModifiedTime`]: any `<prefix>*.<ext>` name matches and the
//!   last-modified time decides.
//!
//! Ties on the recency signal are broken by the lexicographically greatest
//! file name, so the result never depends on directory iteration order.
//!
//! Stamps are UTC (see [`stamp_now`]) so they never run backwards across a
//! daylight-saving change.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::{NaiveDateTime, Utc};
use snafu::{Backtrace, IntoError, Snafu};
use tracing::debug;

/// `strftime` layout of the stamp embedded in artifact names.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAMP_LEN: usize = 15;

/// Current UTC time, the stamp every artifact writer uses by default.
pub fn stamp_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DiscoveryError {
    /// The directory to search does not exist.
    #[snafu(display("Directory {} does not exist", path.display()))]
    DirectoryMissing { path: PathBuf, backtrace: Backtrace },

    /// The path exists but is not a directory.
    #[snafu(display("{} is not a directory", path.display()))]
    NotADirectory { path: PathBuf, backtrace: Backtrace },

    /// The directory exists but holds nothing matching the pattern.
    #[snafu(display("No files matching {pattern} in {}", dir.display()))]
    NoMatches {
        dir: PathBuf,
        pattern: String,
        backtrace: Backtrace,
    },

    /// The directory or one of its entries could not be inspected.
    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Inspect {
        path: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },
}

/// How recency is decided for one family of artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    FilenameStamp,
    ModifiedTime,
}

/// Optional name suffix that keeps two runs within the same second apart.
///
/// Only ASCII letters, digits, `-` and `_` are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId(String);

#[derive(Debug, Snafu)]
#[snafu(display("Invalid run id '{value}': use 1-64 ASCII letters, digits, '-' or '_'"))]
pub struct InvalidRunIdError {
    value: String,
}

impl RunId {
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidRunIdError> {
        let value = value.into();
        let valid = !value.is_empty()
            && value.len() <= 64
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(value))
        } else {
            InvalidRunIdSnafu { value }.fail()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for RunId {
    type Err = InvalidRunIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Filename convention for one artifact family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPattern {
    prefix: String,
    extension: String,
    recency: Recency,
}

impl ArtifactPattern {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>, recency: Recency) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
            recency,
        }
    }

    /// Raw API captures: `data_<stamp>.json`.
    pub fn raw() -> Self {
        Self::new("data_", "json", Recency::FilenameStamp)
    }

    /// Validated batches: `processed_data_<stamp>[_<run-id>].json`.
    pub fn processed() -> Self {
        Self::new("processed_data_", "json", Recency::FilenameStamp)
    }

    /// Rejection diagnostics: `rejections_<stamp>[_<run-id>].log`.
    pub fn rejections() -> Self {
        Self::new("rejections_", "log", Recency::FilenameStamp)
    }

    pub fn recency(&self) -> Recency {
        self.recency
    }

    /// Builds the file name for an artifact produced at `at`.
    pub fn file_name(&self, at: NaiveDateTime, run_id: Option<&RunId>) -> String {
        let stamp = at.format(STAMP_FORMAT);
        match run_id {
            Some(run_id) => format!(
                "{}{stamp}_{}.{}",
                self.prefix,
                run_id.as_str(),
                self.extension
            ),
            None => format!("{}{stamp}.{}", self.prefix, self.extension),
        }
    }

    /// Returns the part of `file_name` between the prefix and the extension.
    fn body<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')
    }

    /// Parses the stamp embedded in `file_name`, if the name follows this
    /// pattern's stamped layout.
    pub fn stamp_of(&self, file_name: &str) -> Option<NaiveDateTime> {
        let body = self.body(file_name)?;
        let stamp = body.get(..STAMP_LEN)?;
        let rest = body.get(STAMP_LEN..)?;
        if !(rest.is_empty() || (rest.len() > 1 && rest.starts_with('_'))) {
            return None;
        }
        NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
    }

    pub fn matches(&self, file_name: &str) -> bool {
        match self.recency {
            Recency::FilenameStamp => self.stamp_of(file_name).is_some(),
            Recency::ModifiedTime => self.body(file_name).is_some(),
        }
    }
}

impl fmt::Display for ArtifactPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.recency {
            Recency::FilenameStamp => write!(
                f,
                "{}<YYYYMMDD_HHMMSS>[_<run-id>].{}",
                self.prefix, self.extension
            ),
            Recency::ModifiedTime => write!(f, "{}*.{}", self.prefix, self.extension),
        }
    }
}

/// Returns the most recent artifact in `dir` that matches `pattern`.
///
/// Fails with [`DiscoveryError::DirectoryMissing`] or
/// [`DiscoveryError::NotADirectory`] when `dir` is unusable and with
/// [`DiscoveryError::NoMatches`] when it holds no matching file.
pub fn find_latest(dir: &Path, pattern: &ArtifactPattern) -> Result<PathBuf, DiscoveryError> {
    let latest = match pattern.recency() {
        Recency::FilenameStamp => pick_latest(candidates(dir, pattern, |_, name| {
            Ok(pattern.stamp_of(name))
        })?),
        Recency::ModifiedTime => pick_latest(candidates(dir, pattern, |path, _| {
            modified(path).map(Some)
        })?),
    };

    match latest {
        Some(path) => {
            debug!(dir = %dir.display(), artifact = %path.display(), "discovered latest artifact");
            Ok(path)
        }
        None => NoMatchesSnafu {
            dir,
            pattern: pattern.to_string(),
        }
        .fail(),
    }
}

/// Collects `(recency key, file name, path)` for every matching regular file.
fn candidates<K, F>(
    dir: &Path,
    pattern: &ArtifactPattern,
    key_of: F,
) -> Result<Vec<(K, String, PathBuf)>, DiscoveryError>
where
    F: Fn(&Path, &str) -> Result<Option<K>, DiscoveryError>,
{
    let metadata = match fs::metadata(dir) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return DirectoryMissingSnafu { path: dir }.fail();
        }
        Err(source) => return Err(inspect_error(dir, source)),
    };
    if !metadata.is_dir() {
        return NotADirectorySnafu { path: dir }.fail();
    }

    let entries = fs::read_dir(dir).map_err(|source| inspect_error(dir, source))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| inspect_error(dir, source))?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !pattern.matches(&name) || !path.is_file() {
            continue;
        }
        if let Some(key) = key_of(&path, &name)? {
            found.push((key, name, path));
        }
    }
    Ok(found)
}

fn pick_latest<K: Ord>(candidates: Vec<(K, String, PathBuf)>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, _, path)| path)
}

fn modified(path: &Path) -> Result<SystemTime, DiscoveryError> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|source| inspect_error(path, source))
}

fn inspect_error(path: &Path, source: io::Error) -> DiscoveryError {
    InspectSnafu { path }.into_error(source)
}
