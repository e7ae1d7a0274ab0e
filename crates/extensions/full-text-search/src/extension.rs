//! Full-text search extension.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use indexsync_core::{Extension, ExtensionContext, ExtensionManifest};
use indexsync_protocols::ExtensionError;

use crate::search::LexicalSearch;
use crate::synchronizer::FtsSynchronizer;

/// Configuration for the full-text search extension.
#[derive(Debug, Clone, Default)]
pub struct FullTextSearchConfig {
    pub collections: Vec<String>,
}

impl FullTextSearchConfig {
    pub fn new(collections: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            collections: collections.into_iter().map(Into::into).collect(),
        }
    }
}

pub struct FullTextSearchExtension {
    manifest: ExtensionManifest,
    config: FullTextSearchConfig,
    search: Option<LexicalSearch>,
}

impl FullTextSearchExtension {
    pub fn new(config: FullTextSearchConfig) -> Self {
        let manifest = ExtensionManifest::new(
            "full-text-search",
            "Full-Text Search",
            env!("CARGO_PKG_VERSION"),
        )
        .with_description("Trigger-maintained FTS5 mirrors and lexical search");
        Self {
            manifest,
            config,
            search: None,
        }
    }

    /// Lexical search, available after initialization.
    pub fn search(&self) -> Option<LexicalSearch> {
        self.search.clone()
    }
}

#[async_trait]
impl Extension for FullTextSearchExtension {
    fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    /// Mirrors existing collections and registers the schema hook. A
    /// configured collection that does not exist yet is mirrored when it is
    /// created.
    async fn initialize(&mut self, ctx: ExtensionContext) -> Result<(), ExtensionError> {
        let names = self.config.collections.clone();
        ctx.hooks
            .register_collection_hook(Arc::new(FtsSynchronizer::new(names.clone())))?;

        for name in &names {
            match ctx.collections.find(name).await? {
                Some(descriptor) => FtsSynchronizer::ensure(&ctx.database, &descriptor).await?,
                None => warn!(
                    "Full-text collection '{}' does not exist yet; it will be indexed on creation",
                    name
                ),
            }
        }

        self.search = Some(LexicalSearch::new(ctx.collections.clone(), names.clone()));
        info!("Full-text search initialized for {:?}", names);
        Ok(())
    }
}

#[cfg(test)]
#[path = "extension_tests.rs"]
mod tests;
