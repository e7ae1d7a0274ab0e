//! Embedding endpoints.
//!
//! These handlers read the raw body so a wrong content type or malformed
//! JSON answers 400 with a plain message instead of the extractor rejection.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use indexsync_protocols::TaskType;
use indexsync_vector_search::GlobalHit;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `/embed/{content,document,query}`.
#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Overrides the endpoint's task type. Unknown names mean `Unspecified`.
    #[serde(default)]
    pub task_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub vector: Vec<f32>,
}

/// Body of `/embed/search`.
#[derive(Debug, Deserialize)]
pub struct GlobalSearchRequest {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
}

fn read_json<T: DeserializeOwned>(headers: &HeaderMap, body: &Bytes) -> Result<T, ApiError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("application/json"));
    if !is_json {
        return Err(ApiError::BadRequest(
            "content-type must be of type application/json".to_string(),
        ));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("error reading json body: {}", e)))
}

async fn embed_with(
    state: &AppState,
    default_task: TaskType,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Json<EmbedResponse>, ApiError> {
    let req: EmbedRequest = read_json(headers, body)?;
    let task = req
        .task_type
        .as_deref()
        .map(TaskType::from_name)
        .unwrap_or(default_task);
    let title = req.title.unwrap_or_default();

    let embedding = state
        .provider
        .embed(task, &title, &req.content)
        .await
        .map_err(|e| ApiError::Internal(format!("error reading embedding content: {}", e)))?;
    debug!("Embedded {} chars as {}", req.content.len(), task);
    Ok(Json(EmbedResponse {
        vector: embedding.vector,
    }))
}

/// POST /embed/content
pub async fn embed_content(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EmbedResponse>, ApiError> {
    embed_with(&state, TaskType::Unspecified, &headers, &body).await
}

/// POST /embed/document
pub async fn embed_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EmbedResponse>, ApiError> {
    embed_with(&state, TaskType::RetrievalDocument, &headers, &body).await
}

/// POST /embed/query
pub async fn embed_query(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EmbedResponse>, ApiError> {
    embed_with(&state, TaskType::RetrievalQuery, &headers, &body).await
}

/// POST /embed/search
///
/// Rebuilds the global embeddings table, then returns the nearest
/// `vector_store` records.
pub async fn embed_search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Vec<GlobalHit>>, ApiError> {
    let req: GlobalSearchRequest = read_json(&headers, &body)?;
    let store = state
        .global_store
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("global vector store is not enabled".to_string()))?;
    let hits = store
        .search(req.title.as_deref().unwrap_or_default(), &req.content)
        .await?;
    info!("Global search returned {} hits", hits.len());
    Ok(Json(hits))
}
