//! Collection CRUD.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use indexsync_protocols::CollectionDescriptor;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/collections
pub async fn list_collections(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CollectionDescriptor>>, ApiError> {
    Ok(Json(state.collections.list().await?))
}

/// POST /api/collections
pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Json(descriptor): Json<CollectionDescriptor>,
) -> Result<Json<CollectionDescriptor>, ApiError> {
    Ok(Json(state.collections.create(descriptor).await?))
}

/// GET /api/collections/{collection}
pub async fn get_collection(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
) -> Result<Json<CollectionDescriptor>, ApiError> {
    Ok(Json(state.collections.get(&collection).await?))
}

/// PATCH /api/collections/{collection}
///
/// The body replaces the field list and indexes. The collection is
/// identified by the path; renaming is not supported.
pub async fn update_collection(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Json(mut descriptor): Json<CollectionDescriptor>,
) -> Result<Json<CollectionDescriptor>, ApiError> {
    let current = state.collections.get(&collection).await?;
    if descriptor.name != current.name {
        return Err(ApiError::BadRequest(format!(
            "collection '{}' cannot be renamed to '{}'",
            current.name, descriptor.name
        )));
    }
    descriptor.id = current.id;
    Ok(Json(state.collections.update(descriptor).await?))
}

/// DELETE /api/collections/{collection}
pub async fn delete_collection(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.collections.delete(&collection).await?;
    Ok(StatusCode::NO_CONTENT)
}
