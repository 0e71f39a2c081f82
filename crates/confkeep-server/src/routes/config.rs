//! Whole-document routes: `/api/config/*`
//!
//! Read or replace the entire config document, and delete a key from the
//! legacy singular `project` field.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::Value;

use super::MessageResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Build the `/api/config` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_config).post(replace_config))
        .route("/{key}", delete(delete_key))
}

/// Return the entire document.
async fn get_config(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.project_store.get_config().await?))
}

/// Overwrite the entire document with the request body, unvalidated.
async fn replace_config(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(document) = body?;
    state.project_store.replace_config(document).await?;
    Ok(Json(MessageResponse::new("Config updated successfully")))
}

/// Delete `key` from the document's `project` field.
async fn delete_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.project_store.delete_top_level_key(&key).await?;
    Ok(Json(MessageResponse::new(format!(
        "Key '{key}' deleted successfully"
    ))))
}
