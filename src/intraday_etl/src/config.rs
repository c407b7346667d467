//! Pipeline settings: parsed from TOML, validated once, then passed by
//! reference to every stage.
//!
//! ```toml
//! required_fields = ["1. open", "2. high", "3. low", "4. close", "5. volume"]
//! log_file = "logs/etl.log"
//!
//! [api]
//! endpoint = "https://www.alphavantage.co/query"
//! symbol = "IBM"
//! interval = "5min"
//! timeout_secs = 10
//!
//! [directories]
//! raw_data = "data/raw_data"
//! processed_data = "data/processed_data"
//! diagnostics = "logs/rejections"
//!
//! [transform]
//! workers = 4
//!
//! [database]
//! url = "data/intraday.db"
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use shared_utils::config::{ConfigError, load_toml, parse_toml};

use crate::models::interval::Interval;

const DEFAULT_ENDPOINT: &str = "https://www.alphavantage.co/query";
const DEFAULT_API_KEY_ENV: &str = "API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub api: ApiSettings,
    pub directories: Directories,
    /// Labels every series entry must carry before coercion is attempted.
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub transform: TransformSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Optional file that receives the log output in addition to stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub symbol: String,
    #[serde(default)]
    pub interval: Interval,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl ApiSettings {
    /// Whole-request timeout for quote calls.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Directories {
    pub raw_data: PathBuf,
    pub processed_data: PathBuf,
    /// Where rejection logs go; no log is written when unset.
    #[serde(default)]
    pub diagnostics: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformSettings {
    /// Worker threads for the transform stage; defaults to the core count.
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSettings {
    /// SQLite database path (or `sqlite:` URL).
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "intraday.db".to_string(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

impl Settings {
    /// Parse and validate settings from a TOML string. Paths stay as written.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = parse_toml(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a TOML file; relative paths are rebased onto
    /// the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut settings: Settings = load_toml(path)?;
        settings.validate()?;
        if let Some(base) = path.parent() {
            settings.rebase(base);
        }
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.api.endpoint.trim().is_empty() {
            return invalid("api.endpoint cannot be empty");
        }
        if self.api.symbol.trim().is_empty() {
            return invalid("api.symbol cannot be empty");
        }
        if self.api.timeout_secs == 0 {
            return invalid("api.timeout_secs must be greater than zero");
        }
        if self.api.api_key_env.trim().is_empty() {
            return invalid("api.api_key_env cannot be empty");
        }
        if self.required_fields.is_empty() {
            return invalid("required_fields cannot be empty");
        }
        if self.required_fields.iter().any(|f| f.trim().is_empty()) {
            return invalid("required_fields cannot contain empty labels");
        }
        if self.transform.workers == Some(0) {
            return invalid("transform.workers must be at least 1");
        }
        if self.database.url.trim().is_empty() {
            return invalid("database.url cannot be empty");
        }
        Ok(())
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.directories.raw_data);
        join(&mut self.directories.processed_data);
        if let Some(dir) = self.directories.diagnostics.as_mut() {
            join(dir);
        }
        if let Some(file) = self.log_file.as_mut() {
            join(file);
        }

        let db_path = Path::new(self.database.url.trim_start_matches("sqlite:"));
        if db_path.is_relative() && self.database.url != ":memory:" {
            self.database.url = base.join(db_path).to_string_lossy().into_owned();
        }
    }

    /// Key of the series block in raw artifacts, e.g. `Time Series (5min)`.
    pub fn series_key(&self) -> String {
        self.api.interval.series_key()
    }

    pub fn workers(&self) -> Option<NonZeroUsize> {
        self.transform.workers.and_then(NonZeroUsize::new)
    }
}
