//! Record and collection hooks.
//!
//! Record hooks are registered per collection name and receive only
//! writes made with [`WriteOrigin::User`](indexsync_protocols::WriteOrigin).
//! Collection hooks see every schema change.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use indexsync_protocols::{CollectionEvent, ExtensionError, IndexError, RecordEvent};

use crate::database::Database;
use crate::record::RecordStore;

/// Reacts to completed record writes in one collection.
#[async_trait]
pub trait RecordHook: Send + Sync {
    /// Unique hook name within a collection.
    fn name(&self) -> &str;

    /// Called after the write has been committed.
    ///
    /// Writes issued through `records` must use
    /// [`WriteOrigin::Synchronizer`](indexsync_protocols::WriteOrigin) or they
    /// re-enter this hook.
    async fn on_record(&self, event: &RecordEvent, records: &RecordStore)
    -> Result<(), IndexError>;

    /// Fields this hook maintains. User writes may not set them.
    fn owned_fields(&self) -> &[&'static str] {
        &[]
    }
}

/// Reacts to collection schema changes.
#[async_trait]
pub trait CollectionHook: Send + Sync {
    fn name(&self) -> &str;

    async fn on_collection(&self, event: &CollectionEvent, db: &Database)
    -> Result<(), IndexError>;
}

/// Typed registry of hooks, populated during extension initialization.
#[derive(Default)]
pub struct HookRegistry {
    record_hooks: DashMap<String, Vec<Arc<dyn RecordHook>>>,
    collection_hooks: RwLock<Vec<Arc<dyn CollectionHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record hook for one collection.
    pub fn register_record_hook(
        &self,
        collection: &str,
        hook: Arc<dyn RecordHook>,
    ) -> Result<(), ExtensionError> {
        let mut hooks = self.record_hooks.entry(collection.to_string()).or_default();
        if hooks.iter().any(|h| h.name() == hook.name()) {
            return Err(ExtensionError::AlreadyRegistered(format!(
                "{}:{}",
                collection,
                hook.name()
            )));
        }
        hooks.push(hook);
        Ok(())
    }

    /// Register a collection hook. Hooks run in registration order.
    pub fn register_collection_hook(&self, hook: Arc<dyn CollectionHook>) -> Result<(), ExtensionError> {
        let mut hooks = self.collection_hooks.write();
        if hooks.iter().any(|h| h.name() == hook.name()) {
            return Err(ExtensionError::AlreadyRegistered(hook.name().to_string()));
        }
        hooks.push(hook);
        Ok(())
    }

    /// Hooks registered for a collection, in registration order.
    pub fn record_hooks(&self, collection: &str) -> Vec<Arc<dyn RecordHook>> {
        self.record_hooks
            .get(collection)
            .map(|hooks| hooks.clone())
            .unwrap_or_default()
    }

    pub fn collection_hooks(&self) -> Vec<Arc<dyn CollectionHook>> {
        self.collection_hooks.read().clone()
    }

    pub fn has_record_hooks(&self, collection: &str) -> bool {
        self.record_hooks
            .get(collection)
            .is_some_and(|hooks| !hooks.is_empty())
    }

    /// Fields owned by the record hooks of a collection.
    pub fn owned_fields(&self, collection: &str) -> Vec<&'static str> {
        self.record_hooks
            .get(collection)
            .map(|hooks| {
                hooks
                    .iter()
                    .flat_map(|h| h.owned_fields().iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
