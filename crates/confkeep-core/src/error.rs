//! Error types for `confkeep-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger. Raw query engine errors keep the engine's message verbatim.

use confkeep_storage::StorageError;

/// Errors from project store operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// A project with this name already exists.
    #[error("project already exists: {name}")]
    DuplicateProject { name: String },

    /// The referenced project does not exist.
    #[error("project not found: {name}")]
    ProjectNotFound { name: String },

    /// The referenced key does not exist under the legacy `project` field.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// The document does not have the shape a mutation needs.
    #[error("config document is not usable: {reason}")]
    InvalidDocument { reason: String },

    /// The underlying document backend failed.
    #[error("project storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from the raw query gateway.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// No statement was supplied.
    #[error("query parameter is required")]
    EmptyQuery,

    /// The database engine rejected or failed the statement.
    #[error("{message}")]
    Engine { message: String },
}

/// Errors from the cookie record store.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The request is missing required fields.
    #[error("invalid cookie request: {reason}")]
    InvalidRequest { reason: String },

    /// No record exists for the project.
    #[error("cookie record not found for project '{project}'")]
    NotFound { project: String },

    /// A concurrent writer created the record first.
    #[error(
        "cookie record for project '{project}' was created concurrently; retry the update or use the upsert endpoint"
    )]
    Conflict { project: String },

    /// The database failed.
    #[error("cookie database error: {reason}")]
    Database { reason: String },
}

impl From<sqlx::Error> for CookieError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            reason: err.to_string(),
        }
    }
}
