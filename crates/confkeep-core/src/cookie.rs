//! Cookie record store: one row per project in the `cookies` table.
//!
//! Writes always stamp `updated_at` with the current time as RFC 3339 text
//! (UTC, microseconds). Reads return the column as stored text, whatever wrote
//! it. The full upsert is a single `INSERT … ON CONFLICT(project) DO UPDATE`
//! statement, so its atomicity comes from SQLite rather than from a
//! read-then-write sequence.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::CookieError;

const RETURNING: &str = "RETURNING id, project, key, value, updated_at";

/// Fixed-width timestamp, so stored values order correctly as text.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A stored cookie record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CookieRecord {
    /// Surrogate row id.
    pub id: i64,
    /// Owning project; unique across the table.
    pub project: String,
    /// Record key.
    pub key: String,
    /// Record value.
    pub value: String,
    /// Time of the last write, as stored.
    pub updated_at: String,
}

/// Outcome of a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieWrite {
    /// An existing row was updated.
    Updated(CookieRecord),
    /// No row existed and a new one was inserted.
    Created(CookieRecord),
}

impl CookieWrite {
    /// The stored record, whichever path produced it.
    #[must_use]
    pub fn record(&self) -> &CookieRecord {
        match self {
            Self::Updated(record) | Self::Created(record) => record,
        }
    }
}

/// CRUD over the `cookies` table.
#[derive(Debug, Clone)]
pub struct CookieStore {
    pool: SqlitePool,
}

impl CookieStore {
    /// Create a store over the given pool. The `cookies` table must exist.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a record for `project`, or overwrite its key, value, and
    /// timestamp if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::InvalidRequest`] if any field is empty and
    /// [`CookieError::Database`] on database failure.
    pub async fn upsert(
        &self,
        project: &str,
        key: &str,
        value: &str,
    ) -> Result<CookieRecord, CookieError> {
        if project.is_empty() || key.is_empty() || value.is_empty() {
            return Err(CookieError::InvalidRequest {
                reason: "project, key and value are required".to_owned(),
            });
        }

        let record = sqlx::query_as::<_, CookieRecord>(&format!(
            "INSERT INTO cookies (project, key, value, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(project) DO UPDATE SET \
                key = excluded.key, \
                value = excluded.value, \
                updated_at = excluded.updated_at \
             {RETURNING}"
        ))
        .bind(project)
        .bind(key)
        .bind(value)
        .bind(now_timestamp())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(project = %project, id = record.id, "cookie record upserted");
        Ok(record)
    }

    /// Update only the supplied fields of `project`'s record.
    ///
    /// Empty strings count as omitted. When no record exists and both fields
    /// were supplied, a new record is inserted instead.
    ///
    /// # Errors
    ///
    /// - [`CookieError::InvalidRequest`] if neither `key` nor `value` is given.
    /// - [`CookieError::NotFound`] if no record exists and a field is missing.
    /// - [`CookieError::Conflict`] if the fallback insert lost a race with a
    ///   concurrent writer.
    pub async fn update_partial(
        &self,
        project: &str,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<CookieWrite, CookieError> {
        let key = key.filter(|k| !k.is_empty());
        let value = value.filter(|v| !v.is_empty());
        if key.is_none() && value.is_none() {
            return Err(CookieError::InvalidRequest {
                reason: "key or value is required".to_owned(),
            });
        }

        let updated = sqlx::query_as::<_, CookieRecord>(&format!(
            "UPDATE cookies SET \
                key = COALESCE(?, key), \
                value = COALESCE(?, value), \
                updated_at = ? \
             WHERE project = ? \
             {RETURNING}"
        ))
        .bind(key)
        .bind(value)
        .bind(now_timestamp())
        .bind(project)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(record) = updated {
            tracing::info!(project = %project, "cookie record updated");
            return Ok(CookieWrite::Updated(record));
        }

        let (Some(key), Some(value)) = (key, value) else {
            return Err(CookieError::NotFound {
                project: project.to_owned(),
            });
        };

        let inserted = sqlx::query_as::<_, CookieRecord>(&format!(
            "INSERT INTO cookies (project, key, value, updated_at) VALUES (?, ?, ?, ?) {RETURNING}"
        ))
        .bind(project)
        .bind(key)
        .bind(value)
        .bind(now_timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                CookieError::Conflict {
                    project: project.to_owned(),
                }
            }
            _ => CookieError::from(err),
        })?;

        tracing::info!(project = %project, id = inserted.id, "cookie record created on update");
        Ok(CookieWrite::Created(inserted))
    }

    /// Fetch `project`'s record.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::NotFound`] if no record exists.
    pub async fn get(&self, project: &str) -> Result<CookieRecord, CookieError> {
        sqlx::query_as::<_, CookieRecord>(
            "SELECT id, project, key, value, updated_at FROM cookies WHERE project = ?",
        )
        .bind(project)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CookieError::NotFound {
            project: project.to_owned(),
        })
    }
}
