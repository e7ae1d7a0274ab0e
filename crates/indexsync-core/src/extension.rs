//! Extension trait and initialization context.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use indexsync_protocols::ExtensionError;

use crate::collection::CollectionStore;
use crate::database::Database;
use crate::hooks::HookRegistry;
use crate::record::RecordStore;

/// Extension metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
}

impl ExtensionManifest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Everything an extension needs to bootstrap schema and register hooks.
#[derive(Clone)]
pub struct ExtensionContext {
    pub database: Database,
    pub collections: CollectionStore,
    pub records: RecordStore,
    pub hooks: Arc<HookRegistry>,
}

impl ExtensionContext {
    /// Build the stores around a database with an empty hook registry.
    pub fn new(database: Database) -> Self {
        let hooks = Arc::new(HookRegistry::new());
        let collections = CollectionStore::new(database.clone(), hooks.clone());
        let records = RecordStore::new(database.clone(), collections.clone(), hooks.clone());
        Self {
            database,
            collections,
            records,
            hooks,
        }
    }
}

/// An index extension: bootstraps its schema and registers hooks.
#[async_trait]
pub trait Extension: Send + Sync + 'static {
    fn manifest(&self) -> &ExtensionManifest;

    /// Called once at startup, in registration order.
    async fn initialize(&mut self, ctx: ExtensionContext) -> Result<(), ExtensionError>;

    async fn shutdown(&self) -> Result<(), ExtensionError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "extension_tests.rs"]
mod tests;
