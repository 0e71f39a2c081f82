//! SQLite database opener.
//!
//! Opens (or creates) the database file behind an `sqlx` connection pool and
//! bootstraps the single `cookies` table. There is no migration system: the
//! table is created with `CREATE TABLE IF NOT EXISTS` and never altered.

use std::path::Path;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::StorageError;

/// Name of the cookie record table.
pub const COOKIES_TABLE: &str = "cookies";

const CREATE_COOKIES: &str = "CREATE TABLE IF NOT EXISTS cookies (\
    id         INTEGER PRIMARY KEY AUTOINCREMENT, \
    project    TEXT    NOT NULL UNIQUE, \
    key        TEXT    NOT NULL, \
    value      TEXT    NOT NULL, \
    updated_at TEXT    NOT NULL\
)";

/// Open the SQLite database at `path`, creating the file and the `cookies`
/// table if they do not exist.
///
/// # Errors
///
/// Returns [`StorageError::Open`] if the database cannot be opened and
/// [`StorageError::Schema`] if the table cannot be created.
pub async fn open(path: impl AsRef<Path>) -> Result<SqlitePool, StorageError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
    }

    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(opts)
        .await
        .map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Open a private in-memory database with the `cookies` table, for tests.
///
/// The pool holds exactly one connection that is never recycled, since each
/// SQLite in-memory connection is its own database.
///
/// # Errors
///
/// Returns [`StorageError::Open`] or [`StorageError::Schema`] on failure.
pub async fn open_in_memory() -> Result<SqlitePool, StorageError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::new().in_memory(true))
        .await
        .map_err(|e| StorageError::Open {
            path: ":memory:".to_owned(),
            reason: e.to_string(),
        })?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Create the `cookies` table if it is missing.
///
/// # Errors
///
/// Returns [`StorageError::Schema`] if the statement fails.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query(CREATE_COOKIES)
        .execute(pool)
        .await
        .map_err(|e| StorageError::Schema {
            table: COOKIES_TABLE.to_owned(),
            reason: e.to_string(),
        })?;
    Ok(())
}
