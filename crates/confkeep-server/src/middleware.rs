//! Authentication middleware for `confkeep`.
//!
//! Every `/api` request must present the shared secret, either in the
//! `X-Auth-Password` header or as `Authorization: Bearer <secret>`. Requests
//! without it are rejected before any handler runs.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the shared secret (`X-Auth-Password`).
pub const AUTH_HEADER: &str = "x-auth-password";

/// Middleware that validates the shared secret.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = presented_secret(req.headers())
        .is_some_and(|secret| bool::from(secret.as_bytes().ct_eq(state.auth_secret.as_bytes())));

    if authorized {
        next.run(req).await
    } else {
        tracing::warn!(path = %req.uri().path(), "rejected request with missing or wrong secret");
        AppError::Unauthorized("Unauthorized".to_owned()).into_response()
    }
}

/// The secret offered by the client, if any.
fn presented_secret(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(value);
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
