//! HTTP route handlers for `confkeep`.
//!
//! Routes are organized by resource:
//! - `config`: whole-document read/replace and legacy key delete
//! - `project`: project CRUD over the `projects` mapping
//! - `query`: raw SQL passthrough
//! - `cookies`: per-project cookie records
//! - `health`: unauthenticated liveness check

pub mod config;
pub mod cookies;
pub mod health;
pub mod project;
pub mod query;

use serde::Serialize;

/// Acknowledgement body used by mutating endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
