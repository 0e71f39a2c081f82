//! Raw query gateway: run caller-supplied SQL against the SQLite store.
//!
//! This is a trusted-operator debug tool. Statements are executed verbatim,
//! with no whitelisting, no transaction wrapping, and no limit on result
//! size. Callers must keep it behind the auth gate.
//!
//! A statement is a *read* when, trimmed and upper-cased, it starts with
//! `SELECT`; reads return every row as a column → JSON value mapping. Anything
//! else is a *write* and returns the number of changed rows.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

use crate::error::QueryError;

/// A single result row keyed by column name.
pub type RowMap = Map<String, Value>;

/// How a statement is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Returns rows.
    Read,
    /// Returns a changed-row count.
    Write,
}

impl StatementKind {
    /// Classify a statement by its leading token.
    #[must_use]
    pub fn classify(statement: &str) -> Self {
        if statement.trim().to_uppercase().starts_with("SELECT") {
            Self::Read
        } else {
            Self::Write
        }
    }
}

/// Result of a raw statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Full result set of a read.
    Rows(Vec<RowMap>),
    /// Rows changed by a write.
    Changes(u64),
}

/// Executes raw SQL against the relational store.
#[derive(Debug, Clone)]
pub struct QueryGateway {
    pool: SqlitePool,
}

impl QueryGateway {
    /// Create a gateway over the given pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Execute `statement` and shape the result by statement kind.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyQuery`] for an empty or whitespace-only
    /// statement, and [`QueryError::Engine`] with the engine's own message
    /// for any execution failure.
    pub async fn execute(&self, statement: &str) -> Result<QueryOutcome, QueryError> {
        if statement.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let kind = StatementKind::classify(statement);
        tracing::debug!(?kind, "executing raw query");

        match kind {
            StatementKind::Read => {
                let rows = sqlx::query(statement)
                    .persistent(false)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(engine_error)?;

                let rows = rows
                    .iter()
                    .map(row_to_json)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(engine_error)?;
                Ok(QueryOutcome::Rows(rows))
            }
            StatementKind::Write => {
                let result = sqlx::query(statement)
                    .persistent(false)
                    .execute(&self.pool)
                    .await
                    .map_err(engine_error)?;
                Ok(QueryOutcome::Changes(result.rows_affected()))
            }
        }
    }
}

/// Keep the engine's message as-is; fall back to the driver's description.
fn engine_error(err: sqlx::Error) -> QueryError {
    let message = match &err {
        sqlx::Error::Database(db_err) => db_err.message().to_owned(),
        other => other.to_string(),
    };
    QueryError::Engine { message }
}

/// Convert a row using each value's SQLite storage class.
fn row_to_json(row: &SqliteRow) -> Result<RowMap, sqlx::Error> {
    let mut out = Map::with_capacity(row.columns().len());

    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_info = raw.type_info();
            match type_info.name() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
                "REAL" => serde_json::Number::from_f64(row.try_get_unchecked::<f64, _>(idx)?)
                    .map_or(Value::Null, Value::Number),
                "BLOB" => Value::String(BASE64.encode(row.try_get_unchecked::<Vec<u8>, _>(idx)?)),
                _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
            }
        };

        out.insert(column.name().to_owned(), value);
    }

    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn make_gateway() -> QueryGateway {
        let pool = confkeep_storage::sqlite::open_in_memory().await.unwrap();
        QueryGateway::new(pool)
    }

    #[test]
    fn classify_is_case_and_whitespace_insensitive() {
        assert_eq!(StatementKind::classify("SELECT 1"), StatementKind::Read);
        assert_eq!(StatementKind::classify("  \n\tselect * from cookies"), StatementKind::Read);
        assert_eq!(StatementKind::classify("SeLeCt 1"), StatementKind::Read);
        assert_eq!(StatementKind::classify("INSERT INTO t VALUES (1)"), StatementKind::Write);
        assert_eq!(StatementKind::classify("WITH x AS (SELECT 1) SELECT * FROM x"), StatementKind::Write);
        assert_eq!(StatementKind::classify("delete from cookies"), StatementKind::Write);
    }

    #[tokio::test]
    async fn empty_statement_is_rejected() {
        let gateway = make_gateway().await;
        assert!(matches!(gateway.execute("").await, Err(QueryError::EmptyQuery)));
        assert!(matches!(gateway.execute("   \n").await, Err(QueryError::EmptyQuery)));
    }

    #[tokio::test]
    async fn lowercase_select_returns_rows() {
        let gateway = make_gateway().await;
        gateway
            .execute("INSERT INTO cookies (project, key, value, updated_at) VALUES ('a', 'k', 'v', 't')")
            .await
            .unwrap();

        let outcome = gateway
            .execute("   select project, key, value from cookies")
            .await
            .unwrap();
        let QueryOutcome::Rows(rows) = outcome else {
            panic!("expected rows, got {outcome:?}");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({ "project": "a", "key": "k", "value": "v" })
        );
    }

    #[tokio::test]
    async fn select_with_no_matches_returns_empty_rows() {
        let gateway = make_gateway().await;
        let outcome = gateway.execute("SELECT * FROM cookies").await.unwrap();
        assert_eq!(outcome, QueryOutcome::Rows(Vec::new()));
    }

    #[tokio::test]
    async fn write_returns_changes() {
        let gateway = make_gateway().await;
        for project in ["a", "b", "c"] {
            let outcome = gateway
                .execute(&format!(
                    "INSERT INTO cookies (project, key, value, updated_at) VALUES ('{project}', 'k', 'v', 't')"
                ))
                .await
                .unwrap();
            assert_eq!(outcome, QueryOutcome::Changes(1));
        }

        let outcome = gateway
            .execute("UPDATE cookies SET value = 'w' WHERE project != 'a'")
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Changes(2));
    }

    #[tokio::test]
    async fn values_map_by_storage_class() {
        let gateway = make_gateway().await;
        let outcome = gateway
            .execute("SELECT 42 AS i, 1.5 AS r, 'txt' AS t, NULL AS n, x'0102' AS b")
            .await
            .unwrap();
        let QueryOutcome::Rows(rows) = outcome else {
            panic!("expected rows, got {outcome:?}");
        };
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({ "i": 42, "r": 1.5, "t": "txt", "n": null, "b": "AQI=" })
        );
    }

    #[tokio::test]
    async fn engine_errors_pass_through() {
        let gateway = make_gateway().await;

        let err = gateway.execute("SELEC nonsense").await.unwrap_err();
        let QueryError::Engine { message } = err else {
            panic!("expected engine error");
        };
        assert!(message.contains("syntax error"), "{message}");

        let err = gateway.execute("SELECT * FROM missing_table").await.unwrap_err();
        assert!(err.to_string().contains("no such table"), "{err}");
    }

    #[tokio::test]
    async fn constraint_violation_is_engine_error() {
        let gateway = make_gateway().await;
        let insert = "INSERT INTO cookies (project, key, value, updated_at) VALUES ('a', 'k', 'v', 't')";
        gateway.execute(insert).await.unwrap();

        let err = gateway.execute(insert).await.unwrap_err();
        assert!(err.to_string().contains("UNIQUE"), "{err}");
    }
}
