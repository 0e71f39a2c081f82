//! Cookie record routes: `/api/cookies/*`
//!
//! One record per project. `POST` upserts a complete record; `PUT` patches
//! the key and/or value and falls back to creating the record when both are
//! supplied.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use confkeep_core::cookie::{CookieRecord, CookieWrite};

/// Build the `/api/cookies` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(upsert_cookie))
        .route("/{project}", get(get_cookie).put(update_cookie))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpsertCookieRequest {
    pub project: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCookieRequest {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CookieWriteResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<u64>,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Create or overwrite a project's record.
async fn upsert_cookie(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpsertCookieRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CookieWriteResponse>), AppError> {
    let Json(body) = body?;
    let record = state
        .cookie_store
        .upsert(
            body.project.as_deref().unwrap_or_default(),
            body.key.as_deref().unwrap_or_default(),
            body.value.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CookieWriteResponse {
            message: "Cookie record created/updated successfully",
            id: Some(record.id),
            changes: None,
        }),
    ))
}

/// Patch a project's record.
async fn update_cookie(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
    body: Result<Json<UpdateCookieRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CookieWriteResponse>), AppError> {
    let Json(body) = body?;
    let outcome = state
        .cookie_store
        .update_partial(&project, body.key.as_deref(), body.value.as_deref())
        .await?;

    let response = match outcome {
        CookieWrite::Updated(_) => (
            StatusCode::OK,
            Json(CookieWriteResponse {
                message: "Cookie record updated successfully",
                id: None,
                changes: Some(1),
            }),
        ),
        CookieWrite::Created(record) => (
            StatusCode::CREATED,
            Json(CookieWriteResponse {
                message: "Cookie record created successfully",
                id: Some(record.id),
                changes: None,
            }),
        ),
    };

    Ok(response)
}

/// Fetch a project's record.
async fn get_cookie(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
) -> Result<Json<CookieRecord>, AppError> {
    Ok(Json(state.cookie_store.get(&project).await?))
}
