//! Lexical search over an FTS mirror.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use indexsync_core::CollectionStore;
use indexsync_core::sql::{column_names, quote_ident, row_to_json};
use indexsync_protocols::{IndexError, SearchOutcome};

use crate::schema::fts_table;

#[derive(Clone)]
pub struct LexicalSearch {
    collections: CollectionStore,
    tracked: Arc<HashSet<String>>,
}

impl LexicalSearch {
    pub fn new(collections: CollectionStore, tracked: impl IntoIterator<Item = String>) -> Self {
        Self {
            collections,
            tracked: Arc::new(tracked.into_iter().collect()),
        }
    }

    pub fn is_tracked(&self, collection: &str) -> bool {
        self.tracked.contains(collection)
    }

    /// Match `query` against `<collection>_fts`, best rank first.
    ///
    /// Rows carry the indexed columns only. A query FTS5 cannot parse fails
    /// as a store error.
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
    ) -> Result<SearchOutcome<Map<String, Value>>, IndexError> {
        let descriptor = self.collections.get(collection).await?;
        if !self.is_tracked(&descriptor.name) {
            return Err(IndexError::not_found(format!(
                "collection '{}' has no full-text index",
                descriptor.name
            )));
        }
        if query.is_empty() {
            return Ok(SearchOutcome::NoContent);
        }

        let table = quote_ident(&fts_table(&descriptor.name));
        let sql = format!("SELECT * FROM {table} WHERE {table} MATCH ?1 ORDER BY rank");
        let q = query.to_string();
        let rows = self
            .collections
            .database()
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let columns = column_names(&stmt);
                let rows = stmt
                    .query_map([&q], |row| row_to_json(row, &columns))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        debug!(
            "full-text-search {} {:?} -> {} rows",
            descriptor.name,
            query,
            rows.len()
        );
        Ok(SearchOutcome::Hits(rows))
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
