//! Per-collection search endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use indexsync_protocols::SearchOutcome;
use indexsync_vector_search::SimilaritySearch;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of `vector-search`.
///
/// `k` stays a string: an unparsable value falls back to the default rather
/// than rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct VectorSearchParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub k: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FullTextSearchParams {
    #[serde(default)]
    pub search: Option<String>,
}

fn respond(outcome: SearchOutcome<Map<String, Value>>) -> Response {
    match outcome {
        SearchOutcome::NoContent => StatusCode::NO_CONTENT.into_response(),
        SearchOutcome::Hits(rows) => Json(rows).into_response(),
    }
}

/// GET /api/collections/{collection}/records/vector-search
pub async fn vector_search(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Query(params): Query<VectorSearchParams>,
) -> Result<Response, ApiError> {
    let search = state
        .vector_search
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("vector search is not enabled".to_string()))?;
    let k = SimilaritySearch::parse_k(params.k.as_deref());
    let outcome = search
        .search(
            &collection,
            params.title.as_deref().unwrap_or_default(),
            params.search.as_deref().unwrap_or_default(),
            k,
        )
        .await?;
    Ok(respond(outcome))
}

/// GET /api/collections/{collection}/records/full-text-search
pub async fn full_text_search(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Query(params): Query<FullTextSearchParams>,
) -> Result<Response, ApiError> {
    let search = state
        .full_text_search
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("full-text search is not enabled".to_string()))?;
    let outcome = search
        .search(&collection, params.search.as_deref().unwrap_or_default())
        .await?;
    Ok(respond(outcome))
}
