//! HTTP route definitions.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::http::{collections, embed, monitoring, records, search};
use crate::state::AppState;

/// Create the main router.
///
/// ## Route Structure
///
/// ```text
/// /api/collections
///   GET    /api/collections                     - List collections
///   POST   /api/collections                     - Create collection
///   GET    /api/collections/{c}                 - Get collection
///   PATCH  /api/collections/{c}                 - Replace fields and indexes
///   DELETE /api/collections/{c}                 - Delete collection
///
///   GET    /api/collections/{c}/records         - List records
///   POST   /api/collections/{c}/records         - Create record
///   GET    /api/collections/{c}/records/{id}    - Get record
///   PATCH  /api/collections/{c}/records/{id}    - Update record
///   DELETE /api/collections/{c}/records/{id}    - Delete record
///
///   GET    /api/collections/{c}/records/vector-search?title=&search=&k=
///   GET    /api/collections/{c}/records/full-text-search?search=
///
/// /embed
///   POST   /embed/content   - Embed, task type unspecified
///   POST   /embed/document  - Embed as a retrieval document
///   POST   /embed/query     - Embed as a retrieval query
///   POST   /embed/search    - Search the global vector store
///
/// /health
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    let collection_routes = Router::new()
        .route(
            "/",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route(
            "/{collection}",
            get(collections::get_collection)
                .patch(collections::update_collection)
                .delete(collections::delete_collection),
        )
        .route(
            "/{collection}/records",
            get(records::list_records).post(records::create_record),
        )
        // Static segments take priority over `{id}`.
        .route(
            "/{collection}/records/vector-search",
            get(search::vector_search),
        )
        .route(
            "/{collection}/records/full-text-search",
            get(search::full_text_search),
        )
        .route(
            "/{collection}/records/{id}",
            get(records::get_record)
                .patch(records::update_record)
                .delete(records::delete_record),
        );

    let embed_routes = Router::new()
        .route("/content", post(embed::embed_content))
        .route("/document", post(embed::embed_document))
        .route("/query", post(embed::embed_query))
        .route("/search", post(embed::embed_search));

    Router::new()
        .nest("/api/collections", collection_routes)
        .nest("/embed", embed_routes)
        .route("/health", get(monitoring::health_check))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
