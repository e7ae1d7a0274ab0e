//! Health check.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    /// Embedding provider id.
    pub provider: String,
    /// sqlite-vec version, absent when the extension is not loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite_vec: Option<String>,
    pub vector_search: bool,
    pub full_text_search: bool,
    pub global_store: bool,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let sqlite_vec = state.database.vec_version().await.ok();
    let status = if sqlite_vec.is_some() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };
    let code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.uptime().as_secs(),
            provider: state.provider.id().to_string(),
            sqlite_vec,
            vector_search: state.vector_search.is_some(),
            full_text_search: state.full_text_search.is_some(),
            global_store: state.global_store.is_some(),
        }),
    )
}
