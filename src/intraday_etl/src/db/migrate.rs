//! Embedded schema migrations.

use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use snafu::ResultExt;
use tracing::info;

use crate::db::{DbError, MigrateSnafu, connection::connect_sqlite};

/// Embedded Diesel migrations bundled with this crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending migrations on the SQLite database at `url`, creating the file
/// if needed.
pub fn run_sqlite(url: &str) -> Result<(), DbError> {
    let mut conn = connect_sqlite(url)?;
    apply(&mut conn)
}

/// Runs pending migrations on an open connection.
pub fn apply(conn: &mut SqliteConnection) -> Result<(), DbError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| MigrateSnafu { message: e.to_string() }.build())?;
    if !applied.is_empty() {
        info!(count = applied.len(), "applied database migrations");
    }
    Ok(())
}
