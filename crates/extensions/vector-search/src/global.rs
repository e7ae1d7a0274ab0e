//! The ungrouped `vector_store` collection.
//!
//! Records carry their own `task_type` and a JSON `vector` column written by
//! [`GlobalVectorStore`]'s record hook. The `vector_store_embeddings` table is
//! rebuilt wholesale from that column before every search.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::params;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use indexsync_core::sql::quote_ident;
use indexsync_core::{CollectionStore, RecordHook, RecordStore};
use indexsync_protocols::{
    CollectionDescriptor, EmbeddingProvider, FieldKind, FieldSchema, IndexError, RecordEvent,
    RecordEventKind, TaskType, WriteOrigin,
};

use crate::store::{EmbeddingStore, embeddings_table};

/// Name of the global collection.
pub const GLOBAL_COLLECTION: &str = "vector_store";

/// One global search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalHit {
    /// Record id in `vector_store`.
    pub id: String,
    pub distance: f64,
}

#[derive(Clone)]
pub struct GlobalVectorStore {
    collections: CollectionStore,
    provider: Arc<dyn EmbeddingProvider>,
    k: usize,
}

impl GlobalVectorStore {
    pub fn new(collections: CollectionStore, provider: Arc<dyn EmbeddingProvider>, k: usize) -> Self {
        Self {
            collections,
            provider,
            k,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Create `vector_store` and its embeddings table if missing.
    pub async fn bootstrap(&self) -> Result<CollectionDescriptor, IndexError> {
        let descriptor = match self.collections.find(GLOBAL_COLLECTION).await? {
            Some(existing) => existing,
            None => {
                let created = self
                    .collections
                    .create(
                        CollectionDescriptor::new(GLOBAL_COLLECTION)
                            .with_field(FieldSchema::text("title"))
                            .with_field(FieldSchema::text("content").required())
                            .with_field(FieldSchema::text("task_type"))
                            .with_field(FieldSchema::new("vector", FieldKind::Json)),
                    )
                    .await?;
                info!("Bootstrapped global collection '{}'", GLOBAL_COLLECTION);
                created
            }
        };
        EmbeddingStore::new(self.collections.database().clone(), GLOBAL_COLLECTION)
            .ensure(self.provider.dimension())
            .await?;
        Ok(descriptor)
    }

    /// Rebuild `vector_store_embeddings` from the `vector` column.
    ///
    /// Rows whose vector is missing or has the wrong length are skipped.
    /// Returns the number of rows indexed.
    pub async fn sync(&self) -> Result<usize, IndexError> {
        let dimension = self.provider.dimension();
        let count = self
            .collections
            .database()
            .call(move |conn| {
                let tx = conn.transaction()?;
                let count = sync_in(&tx, dimension)?;
                tx.commit()?;
                Ok(count)
            })
            .await?;
        debug!("Synchronized {} global embeddings", count);
        Ok(count)
    }

    /// Re-synchronize, then return the `k` records nearest to `content`.
    pub async fn search(&self, title: &str, content: &str) -> Result<Vec<GlobalHit>, IndexError> {
        if content.is_empty() {
            return Err(IndexError::validation("content is required"));
        }
        let embedding = self
            .provider
            .embed(TaskType::RetrievalQuery, title, content)
            .await?;
        embedding.check_dimension(self.provider.dimension())?;

        let dimension = self.provider.dimension();
        let blob = embedding.to_blob();
        let k = self.k.max(1) as i64;
        let hits = self
            .collections
            .database()
            .call(move |conn| {
                let tx = conn.transaction()?;
                let indexed = sync_in(&tx, dimension)?;
                let hits = if indexed == 0 {
                    Vec::new()
                } else {
                    let sql = format!(
                        "WITH knn AS (
                            SELECT rowid AS embedding_id, distance FROM {embeddings}
                            WHERE embedding MATCH ?1 AND k = ?2
                        )
                        SELECT v.id, knn.distance FROM knn
                        JOIN {records} v ON v.rowid = knn.embedding_id
                        ORDER BY knn.distance",
                        embeddings = quote_ident(&embeddings_table(GLOBAL_COLLECTION)),
                        records = quote_ident(GLOBAL_COLLECTION),
                    );
                    let mut stmt = tx.prepare(&sql)?;
                    let rows = stmt
                        .query_map(params![blob, k], |row| {
                            Ok(GlobalHit {
                                id: row.get(0)?,
                                distance: row.get(1)?,
                            })
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                };
                tx.commit()?;
                Ok(hits)
            })
            .await?;
        Ok(hits)
    }

    async fn embed_record(&self, event: &RecordEvent, records: &RecordStore) -> Result<(), IndexError> {
        let record = &event.record;
        let task = TaskType::from_name(record.get_str("task_type"));
        let embedding = self
            .provider
            .embed(task, record.get_str("title"), record.get_str("content"))
            .await?;
        embedding.check_dimension(self.provider.dimension())?;

        let mut patch = Map::new();
        patch.insert(
            "vector".to_string(),
            Value::from(
                embedding
                    .vector
                    .iter()
                    .map(|v| f64::from(*v))
                    .collect::<Vec<_>>(),
            ),
        );
        records
            .update(GLOBAL_COLLECTION, &record.id, patch, WriteOrigin::Synchronizer)
            .await?;
        debug!("Embedded global record {} as {}", record.id, task);
        Ok(())
    }
}

/// Delete every row, then copy valid vectors keyed by the record rowid.
fn sync_in(conn: &rusqlite::Connection, dimension: usize) -> rusqlite::Result<usize> {
    let embeddings = quote_ident(&embeddings_table(GLOBAL_COLLECTION));
    conn.execute(&format!("DELETE FROM {}", embeddings), [])?;
    conn.execute(
        &format!(
            "INSERT INTO {embeddings} (rowid, embedding)
             SELECT rowid, vector FROM {records}
             WHERE json_valid(vector) AND json_type(vector) = 'array'
               AND json_array_length(vector) = ?1",
            embeddings = embeddings,
            records = quote_ident(GLOBAL_COLLECTION),
        ),
        [dimension as i64],
    )
}

#[async_trait]
impl RecordHook for GlobalVectorStore {
    fn name(&self) -> &str {
        "vector-search-global"
    }

    async fn on_record(&self, event: &RecordEvent, records: &RecordStore) -> Result<(), IndexError> {
        match event.kind {
            RecordEventKind::Created | RecordEventKind::Updated => {
                self.embed_record(event, records).await
            }
            RecordEventKind::Deleted => Ok(()),
        }
    }

    fn owned_fields(&self) -> &[&'static str] {
        &["vector"]
    }
}

#[cfg(test)]
#[path = "global_tests.rs"]
mod tests;
