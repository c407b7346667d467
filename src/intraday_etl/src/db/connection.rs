//! SQLite connection helpers.

use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};
use snafu::ResultExt;

use crate::db::{ConnectSnafu, DbError, PragmaSnafu, sqlite_path};

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> Result<SqliteConnection, DbError> {
    let path = sqlite_path(database_url);
    let mut conn = SqliteConnection::establish(path).context(ConnectSnafu { url: path })?;

    // Better read concurrency while a load is running
    sql_query("PRAGMA journal_mode=WAL;")
        .execute(&mut conn)
        .context(PragmaSnafu)?;
    sql_query("PRAGMA foreign_keys=ON;")
        .execute(&mut conn)
        .context(PragmaSnafu)?;
    sql_query("PRAGMA busy_timeout=5000;")
        .execute(&mut conn)
        .context(PragmaSnafu)?;
    Ok(conn)
}
