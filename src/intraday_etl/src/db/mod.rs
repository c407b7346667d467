//! Database utilities for connections and schema migrations.
//!
//! - [`connection::connect_sqlite`] opens a connection with WAL journaling,
//!   `foreign_keys=ON` and a 5000ms `busy_timeout`.
//! - [`migrate::run_sqlite`] applies the embedded migrations that create the
//!   `intraday_data` table.
//!
//! Example:
//! ```no_run
//! use intraday_etl::db::{connection, migrate};
//!
//! let db_path = std::env::temp_dir().join("intraday_etl_example.db");
//! migrate::run_sqlite(db_path.to_str().unwrap()).expect("migrations");
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;

use snafu::{Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DbError {
    #[snafu(display("Failed to open database {url}: {source}"))]
    Connect {
        url: String,
        source: diesel::ConnectionError,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to configure connection: {source}"))]
    Pragma {
        source: diesel::result::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to run migrations: {message}"))]
    Migrate { message: String, backtrace: Backtrace },
}

/// Strips an optional `sqlite:` / `sqlite://` scheme; SQLite itself expects a
/// bare path (or `:memory:`).
pub fn sqlite_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

#[cfg(test)]
mod tests {
    use super::sqlite_path;

    #[test]
    fn scheme_is_optional() {
        assert_eq!(sqlite_path("sqlite:///tmp/a.db"), "/tmp/a.db");
        assert_eq!(sqlite_path("sqlite:data/a.db"), "data/a.db");
        assert_eq!(sqlite_path("data/a.db"), "data/a.db");
        assert_eq!(sqlite_path(":memory:"), ":memory:");
    }
}
