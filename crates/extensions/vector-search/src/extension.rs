//! Vector search extension.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use indexsync_core::{Extension, ExtensionContext, ExtensionManifest};
use indexsync_protocols::{EmbeddingProvider, ExtensionError};

use crate::bootstrap::{CollectionBootstrapper, TrackedCollection};
use crate::global::{GLOBAL_COLLECTION, GlobalVectorStore};
use crate::search::SimilaritySearch;
use crate::synchronizer::{EmbeddingCleanup, LifecycleSynchronizer};

/// Configuration for the vector search extension.
#[derive(Debug, Clone)]
pub struct VectorSearchConfig {
    /// Collections kept in sync with an embeddings table.
    pub collections: Vec<TrackedCollection>,
    /// Bootstrap the global `vector_store` collection.
    pub global_store: bool,
    /// Neighbours returned by a global search.
    pub global_k: usize,
}

impl Default for VectorSearchConfig {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            global_store: false,
            global_k: 20,
        }
    }
}

impl VectorSearchConfig {
    pub fn track(mut self, collection: TrackedCollection) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn with_global_store(mut self, k: usize) -> Self {
        self.global_store = true;
        self.global_k = k;
        self
    }

    fn names(&self) -> Vec<String> {
        self.collections.iter().map(|c| c.name.clone()).collect()
    }
}

/// Bootstraps tracked collections, registers the lifecycle hooks and
/// exposes the search services once initialized.
pub struct VectorSearchExtension {
    manifest: ExtensionManifest,
    provider: Arc<dyn EmbeddingProvider>,
    config: VectorSearchConfig,
    search: Option<SimilaritySearch>,
    global: Option<GlobalVectorStore>,
}

impl VectorSearchExtension {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: VectorSearchConfig) -> Self {
        let manifest = ExtensionManifest::new("vector-search", "Vector Search", env!("CARGO_PKG_VERSION"))
            .with_description("Embedding synchronization and similarity search over sqlite-vec");
        Self {
            manifest,
            provider,
            config,
            search: None,
            global: None,
        }
    }

    /// Similarity search, available after initialization.
    pub fn search(&self) -> Option<SimilaritySearch> {
        self.search.clone()
    }

    /// Global store, available after initialization when enabled.
    pub fn global(&self) -> Option<GlobalVectorStore> {
        self.global.clone()
    }
}

#[async_trait]
impl Extension for VectorSearchExtension {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    async fn initialize(&mut self, ctx: ExtensionContext) -> Result<(), ExtensionError> {
        let dimension = self.provider.dimension();
        let names = self.config.names();

        // Registered before bootstrapping so collections created below get
        // their tables through the Created event as well.
        ctx.hooks
            .register_collection_hook(Arc::new(EmbeddingCleanup::new(names.clone(), dimension)))?;

        let bootstrapper = CollectionBootstrapper::new(ctx.collections.clone(), dimension);
        let synchronizer = Arc::new(LifecycleSynchronizer::new(self.provider.clone()));
        for tracked in &self.config.collections {
            bootstrapper.ensure(tracked).await?;
            ctx.hooks
                .register_record_hook(&tracked.name, synchronizer.clone())?;
        }

        if self.config.global_store {
            let global = GlobalVectorStore::new(
                ctx.collections.clone(),
                self.provider.clone(),
                self.config.global_k,
            );
            global.bootstrap().await?;
            ctx.hooks
                .register_record_hook(GLOBAL_COLLECTION, Arc::new(global.clone()))?;
            self.global = Some(global);
        }

        self.search = Some(SimilaritySearch::new(
            ctx.collections.clone(),
            self.provider.clone(),
            names.clone(),
        ));

        info!(
            "Vector search initialized for {:?} (provider '{}', global store {})",
            names,
            self.provider.id(),
            self.config.global_store
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "extension_tests.rs"]
mod tests;
