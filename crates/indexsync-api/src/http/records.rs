//! Record CRUD.
//!
//! Every write here is a user write, so record hooks run for it.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Map, Value};

use indexsync_protocols::{Record, WriteOrigin};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/collections/{collection}/records
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.records.list(&collection).await?))
}

/// POST /api/collections/{collection}/records
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<Record>, ApiError> {
    let created = state
        .records
        .create(&collection, fields, WriteOrigin::User)
        .await?;
    // Re-read so values written back by hooks are included.
    Ok(Json(state.records.get(&collection, &created.id).await?))
}

/// GET /api/collections/{collection}/records/{id}
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Record>, ApiError> {
    Ok(Json(state.records.get(&collection, &id).await?))
}

/// PATCH /api/collections/{collection}/records/{id}
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<Record>, ApiError> {
    state
        .records
        .update(&collection, &id, patch, WriteOrigin::User)
        .await?;
    Ok(Json(state.records.get(&collection, &id).await?))
}

/// DELETE /api/collections/{collection}/records/{id}
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .records
        .delete(&collection, &id, WriteOrigin::User)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
