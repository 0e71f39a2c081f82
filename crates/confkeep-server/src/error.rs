//! HTTP error types for the `confkeep` server.
//!
//! Maps domain errors from `confkeep-core` into appropriate HTTP responses.
//! Every error variant produces a JSON body with a machine-readable `error`
//! field and a human-readable `message`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use confkeep_core::error::{CookieError, ProjectError, QueryError};

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Missing or wrong shared secret.
    Unauthorized(String),
    /// Requested resource not found.
    NotFound(String),
    /// Client sent invalid input, or a raw statement failed.
    BadRequest(String),
    /// A uniqueness conflict the client should retry.
    Conflict(String),
    /// Storage unavailable or another server-side failure.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ProjectError> for AppError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::DuplicateProject { .. } => Self::BadRequest(err.to_string()),
            ProjectError::ProjectNotFound { .. } | ProjectError::KeyNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            ProjectError::InvalidDocument { .. } | ProjectError::Storage(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::EmptyQuery | QueryError::Engine { .. } => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<CookieError> for AppError {
    fn from(err: CookieError) -> Self {
        match err {
            CookieError::InvalidRequest { .. } => Self::BadRequest(err.to_string()),
            CookieError::NotFound { .. } => Self::NotFound(err.to_string()),
            CookieError::Conflict { .. } => Self::Conflict(err.to_string()),
            CookieError::Database { .. } => Self::Internal(err.to_string()),
        }
    }
}
