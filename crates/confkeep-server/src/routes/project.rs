//! Project routes: `/api/project/*`
//!
//! List, create, replace, and delete projects. Single-key edits are composed
//! by the client: it reads the project, changes the mapping locally, and
//! sends the whole mapping back with `PUT`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use super::MessageResponse;
use crate::error::AppError;
use crate::state::AppState;
use confkeep_core::project::Projects;

/// Build the `/api/project` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/{name}",
            get(get_project).put(replace_project).delete(delete_project),
        )
}

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceProjectRequest {
    pub data: Option<Value>,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Return the `projects` mapping.
async fn list_projects(State(state): State<Arc<AppState>>) -> Result<Json<Projects>, AppError> {
    Ok(Json(state.project_store.list_projects().await?))
}

/// Return one project's mapping.
async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.project_store.get_project(&name).await?))
}

/// Create a project, optionally with initial data.
async fn create_project(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(body) = body?;
    let name = body
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("project name is required".to_owned()))?;

    let data = body.data.filter(|data| !is_blank(data));
    state.project_store.create_project(&name, data).await?;
    Ok(Json(MessageResponse::new("Project added successfully")))
}

/// `null`, `false`, `0`, and `""` mean "no initial data".
fn is_blank(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Overwrite a project's mapping.
async fn replace_project(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Result<Json<ReplaceProjectRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(body) = body?;
    let data = body
        .data
        .ok_or_else(|| AppError::BadRequest("project data is required".to_owned()))?;

    state.project_store.replace_project(&name, data).await?;
    Ok(Json(MessageResponse::new("Project updated successfully")))
}

/// Delete a project.
async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.project_store.delete_project(&name).await?;
    Ok(Json(MessageResponse::new(format!(
        "Project '{name}' deleted successfully"
    ))))
}
