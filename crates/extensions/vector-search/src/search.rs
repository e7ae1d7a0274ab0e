//! Similarity search over a tracked collection.

use std::collections::HashSet;
use std::sync::Arc;

use rusqlite::params;
use serde_json::{Map, Value};
use tracing::debug;

use indexsync_core::CollectionStore;
use indexsync_core::sql::{column_names, quote_ident, sql_to_json};
use indexsync_protocols::{EmbeddingProvider, IndexError, SearchOutcome, TaskType};

use crate::store::embeddings_table;

/// Neighbours returned when the caller does not ask for a count.
pub const DEFAULT_K: usize = 5;
/// Upper bound on `k` accepted by vec0.
pub const MAX_K: usize = 4096;

/// Embeds a query and ranks the records of a tracked collection by distance.
#[derive(Clone)]
pub struct SimilaritySearch {
    collections: CollectionStore,
    provider: Arc<dyn EmbeddingProvider>,
    tracked: Arc<HashSet<String>>,
}

impl SimilaritySearch {
    pub fn new(
        collections: CollectionStore,
        provider: Arc<dyn EmbeddingProvider>,
        tracked: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            collections,
            provider,
            tracked: Arc::new(tracked.into_iter().collect()),
        }
    }

    pub fn is_tracked(&self, collection: &str) -> bool {
        self.tracked.contains(collection)
    }

    /// Interpret a raw `k` query parameter: missing, unparsable or
    /// non-positive values fall back to [`DEFAULT_K`]; large values are capped
    /// at [`MAX_K`].
    pub fn parse_k(raw: Option<&str>) -> usize {
        raw.and_then(|k| k.trim().parse::<i64>().ok())
            .filter(|k| *k > 0)
            .map(|k| (k as u64).min(MAX_K as u64) as usize)
            .unwrap_or(DEFAULT_K)
    }

    /// Search `collection` for the `k` records nearest to `query`.
    ///
    /// Each hit carries the record's columns plus `rank` (1-based) and
    /// `distance`. Embedding rows without an owning record are still returned,
    /// with null record columns.
    pub async fn search(
        &self,
        collection: &str,
        title: &str,
        query: &str,
        k: usize,
    ) -> Result<SearchOutcome<Map<String, Value>>, IndexError> {
        let descriptor = self.collections.get(collection).await?;
        if !self.is_tracked(&descriptor.name) {
            return Err(IndexError::not_found(format!(
                "collection '{}' has no vector index",
                descriptor.name
            )));
        }
        if query.is_empty() {
            return Ok(SearchOutcome::NoContent);
        }

        let embedding = self
            .provider
            .embed(TaskType::RetrievalQuery, title, query)
            .await?;
        embedding.check_dimension(self.provider.dimension())?;

        let table = embeddings_table(&descriptor.name);
        let sql = format!(
            "WITH knn AS (
                SELECT rowid AS embedding_id, distance FROM {embeddings}
                WHERE embedding MATCH ?1 AND k = ?2
            )
            SELECT knn.distance, v.* FROM knn
            LEFT JOIN {records} v ON v.vector_id = knn.embedding_id
            ORDER BY knn.distance",
            embeddings = quote_ident(&table),
            records = quote_ident(&descriptor.name),
        );
        let blob = embedding.to_blob();
        let k = k.clamp(1, MAX_K);

        let hits = self
            .collections
            .database()
            .call(move |conn| {
                let empty: bool = conn.query_row(
                    &format!("SELECT NOT EXISTS(SELECT 1 FROM {} LIMIT 1)", quote_ident(&table)),
                    [],
                    |row| row.get(0),
                )?;
                if empty {
                    return Ok(Vec::new());
                }

                let mut stmt = conn.prepare(&sql)?;
                let columns = column_names(&stmt);
                let rows = stmt
                    .query_map(params![blob, k as i64], |row| {
                        let mut hit = Map::with_capacity(columns.len() + 1);
                        for (i, name) in columns.iter().enumerate().skip(1) {
                            hit.insert(name.clone(), sql_to_json(row.get_ref(i)?));
                        }
                        hit.insert("distance".to_string(), sql_to_json(row.get_ref(0)?));
                        Ok(hit)
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        let hits: Vec<_> = hits
            .into_iter()
            .enumerate()
            .map(|(i, mut hit)| {
                hit.insert("rank".to_string(), Value::from(i + 1));
                hit
            })
            .collect();

        debug!(
            "vector-search {} k={} -> {} hits",
            descriptor.name,
            k,
            hits.len()
        );
        Ok(SearchOutcome::Hits(hits))
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
