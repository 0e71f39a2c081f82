//! `confkeep` HTTP server.
//!
//! Wires the project store, raw query gateway, and cookie store into an Axum
//! router. Serves the JSON API at `/api/*` (behind the shared-secret gate)
//! and, optionally, the built web UI at `/`.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
