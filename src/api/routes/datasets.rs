//! Dataset Routes
//!
//! Endpoints for managing the dataset registry.
//!
//! - PUT /api/v1/datasets/:id/:kind - Ingest a dataset payload
//! - DELETE /api/v1/datasets/:id - Remove a dataset
//! - GET /api/v1/datasets - List registered datasets

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::ResultResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::dataset::{Dataset, DatasetKind, DatasetSummary};
use crate::ingest::parse_payload;

/// PUT /api/v1/datasets/:id/:kind
///
/// Decode the raw payload body, register the dataset, and return the ids of
/// all datasets now in the registry.
pub async fn put_dataset(
    State(state): State<Arc<AppState>>,
    Path((id, kind)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<ResultResponse<Vec<String>>>> {
    let kind = DatasetKind::parse(&kind)
        .ok_or_else(|| ApiError::Validation(format!("unknown dataset kind {:?}", kind)))?;

    let entries = parse_payload(kind, &body)?;
    tracing::info!(dataset = %id, ?kind, rows = entries.len(), "ingested dataset payload");

    let ids = state.store.add(Dataset::new(id, kind, entries)).await?;
    Ok(Json(ResultResponse::new(ids)))
}

/// DELETE /api/v1/datasets/:id
///
/// Remove a dataset; 404 when no dataset with that id exists.
pub async fn delete_dataset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResultResponse<String>>> {
    let removed = state.store.remove(&id).await?;
    tracing::info!(dataset = %removed, "removed dataset");
    Ok(Json(ResultResponse::new(removed)))
}

/// GET /api/v1/datasets
///
/// List all registered datasets with their kind and row count.
pub async fn list_datasets(
    State(state): State<Arc<AppState>>,
) -> Json<ResultResponse<Vec<DatasetSummary>>> {
    Json(ResultResponse::new(state.store.list().await))
}
