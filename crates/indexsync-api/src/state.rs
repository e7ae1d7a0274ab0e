//! Application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexsync_core::{CollectionStore, Database, ExtensionContext, RecordStore};
use indexsync_full_text_search::LexicalSearch;
use indexsync_protocols::EmbeddingProvider;
use indexsync_vector_search::{GlobalVectorStore, SimilaritySearch};

/// Application state shared across handlers.
pub struct AppState {
    pub database: Database,
    pub collections: CollectionStore,
    pub records: RecordStore,
    pub provider: Arc<dyn EmbeddingProvider>,
    pub vector_search: Option<SimilaritySearch>,
    pub full_text_search: Option<LexicalSearch>,
    pub global_store: Option<GlobalVectorStore>,
    start_time: Instant,
}

impl AppState {
    /// State over an initialized extension context. Search services are
    /// attached with the `with_*` builders.
    pub fn new(ctx: &ExtensionContext, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            database: ctx.database.clone(),
            collections: ctx.collections.clone(),
            records: ctx.records.clone(),
            provider,
            vector_search: None,
            full_text_search: None,
            global_store: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_vector_search(mut self, search: Option<SimilaritySearch>) -> Self {
        self.vector_search = search;
        self
    }

    pub fn with_full_text_search(mut self, search: Option<LexicalSearch>) -> Self {
        self.full_text_search = search;
        self
    }

    pub fn with_global_store(mut self, store: Option<GlobalVectorStore>) -> Self {
        self.global_store = store;
        self
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
