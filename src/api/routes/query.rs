//! Query Routes
//!
//! Endpoint for evaluating structured queries.
//!
//! - POST /api/v1/query - Evaluate a query

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::ResultResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::engine::{evaluate, OutputRow};

/// POST /api/v1/query
///
/// Evaluate a query against the current dataset snapshot. The snapshot is
/// taken once, so a concurrent dataset removal cannot affect a query already
/// in flight.
pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<serde_json::Value>,
) -> ApiResult<Json<ResultResponse<Vec<OutputRow>>>> {
    let snapshot = state.store.snapshot().await;
    let rows = evaluate(&raw, &*snapshot)?;
    tracing::debug!(rows = rows.len(), "query evaluated");
    Ok(Json(ResultResponse::new(rows)))
}
