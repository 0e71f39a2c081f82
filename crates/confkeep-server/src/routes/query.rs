//! Raw query route: `/api/query`
//!
//! Admin trapdoor for trusted operators. The statement runs verbatim against
//! the SQLite store; engine errors come back as 400 with the engine's message.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use confkeep_core::query::{QueryOutcome, RowMap};

/// Maximum raw statements executing at once.
const MAX_CONCURRENT_QUERIES: usize = 4;

/// Build the `/api/query` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(run_query))
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            MAX_CONCURRENT_QUERIES,
        ))
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Rows { results: Vec<RowMap> },
    Changes { message: &'static str, changes: u64 },
}

/// Execute a raw statement.
async fn run_query(
    State(state): State<Arc<AppState>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let Json(body) = body?;
    let statement = body.query.unwrap_or_default();

    let response = match state.query_gateway.execute(&statement).await? {
        QueryOutcome::Rows(results) => QueryResponse::Rows { results },
        QueryOutcome::Changes(changes) => QueryResponse::Changes {
            message: "Query executed successfully",
            changes,
        },
    };

    Ok(Json(response))
}
