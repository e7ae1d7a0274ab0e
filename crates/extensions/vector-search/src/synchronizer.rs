//! Lifecycle synchronizer: keeps `<collection>_embeddings` consistent with
//! record writes.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use indexsync_core::{CollectionHook, Database, RecordHook, RecordStore};
use indexsync_protocols::{
    CollectionEvent, CollectionEventKind, EmbeddingProvider, IndexError, RecordEvent,
    RecordEventKind, TaskType, WriteOrigin,
};

use crate::store::{EmbeddingStore, embeddings_table};

/// Record hook for tracked collections.
///
/// On create/update the new embedding is computed first; only on success are
/// the old row deleted, the new row inserted and `vector_id` written back,
/// all in one transaction. The write-back uses [`WriteOrigin::Synchronizer`]
/// so it never re-enters this hook.
pub struct LifecycleSynchronizer {
    provider: Arc<dyn EmbeddingProvider>,
}

impl LifecycleSynchronizer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    async fn replace(&self, event: &RecordEvent, records: &RecordStore) -> Result<(), IndexError> {
        let record = &event.record;
        let embedding = self
            .provider
            .embed(
                TaskType::RetrievalDocument,
                record.get_str("title"),
                record.get_str("content"),
            )
            .await?;
        embedding.check_dimension(self.provider.dimension())?;

        let table = embeddings_table(&record.collection);
        let blob = embedding.to_blob();
        let updated = records
            .update_with(
                &record.collection,
                &record.id,
                WriteOrigin::Synchronizer,
                move |tx, current| {
                    if let Some(old) = current.get_i64("vector_id") {
                        EmbeddingStore::delete_in(tx, &table, old)?;
                    }
                    let new_id = EmbeddingStore::insert_in(tx, &table, &blob)?;
                    let mut patch = Map::new();
                    patch.insert("vector_id".to_string(), Value::from(new_id));
                    Ok(patch)
                },
            )
            .await?;

        debug!(
            "Synchronized embedding for {}/{} -> vector_id {:?}",
            record.collection,
            record.id,
            updated.get_i64("vector_id")
        );
        Ok(())
    }

    async fn remove(&self, event: &RecordEvent, records: &RecordStore) -> Result<(), IndexError> {
        let record = &event.record;
        let Some(vector_id) = record.get_i64("vector_id") else {
            return Ok(());
        };
        let removed = EmbeddingStore::new(records.database().clone(), &record.collection)
            .delete_by_id(vector_id)
            .await?;
        debug!(
            "Removed embedding {} for deleted {}/{} ({})",
            vector_id, record.collection, record.id, removed
        );
        Ok(())
    }
}

#[async_trait]
impl RecordHook for LifecycleSynchronizer {
    fn name(&self) -> &str {
        "vector-search"
    }

    async fn on_record(&self, event: &RecordEvent, records: &RecordStore) -> Result<(), IndexError> {
        match event.kind {
            RecordEventKind::Created | RecordEventKind::Updated => self.replace(event, records).await,
            RecordEventKind::Deleted => self.remove(event, records).await,
        }
    }

    fn owned_fields(&self) -> &[&'static str] {
        &["vector_id"]
    }
}

/// Collection hook that owns the embeddings tables of tracked collections.
pub struct EmbeddingCleanup {
    tracked: HashSet<String>,
    dimension: usize,
}

impl EmbeddingCleanup {
    pub fn new(tracked: impl IntoIterator<Item = String>, dimension: usize) -> Self {
        Self {
            tracked: tracked.into_iter().collect(),
            dimension,
        }
    }
}

#[async_trait]
impl CollectionHook for EmbeddingCleanup {
    fn name(&self) -> &str {
        "vector-search"
    }

    async fn on_collection(&self, event: &CollectionEvent, db: &Database) -> Result<(), IndexError> {
        let name = &event.collection.name;
        if !self.tracked.contains(name) {
            return Ok(());
        }
        let store = EmbeddingStore::new(db.clone(), name);
        match event.kind {
            CollectionEventKind::Created => store.ensure(self.dimension).await?,
            CollectionEventKind::Deleting => {
                store.drop_table().await?;
                info!("Dropped embeddings for deleted collection '{}'", name);
            }
            CollectionEventKind::Updating | CollectionEventKind::Updated => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "synchronizer_tests.rs"]
mod tests;
