//! Shared application state for the `confkeep` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`.

use std::sync::Arc;

use confkeep_core::cookie::CookieStore;
use confkeep_core::project::ProjectStore;
use confkeep_core::query::QueryGateway;

use crate::config::AuthSecret;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Project CRUD over the JSON document.
    pub project_store: Arc<ProjectStore>,
    /// Raw SQL passthrough.
    pub query_gateway: Arc<QueryGateway>,
    /// Cookie record CRUD.
    pub cookie_store: Arc<CookieStore>,
    /// Shared secret checked by the auth middleware.
    pub auth_secret: AuthSecret,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
