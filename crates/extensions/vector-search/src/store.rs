//! Embedding store over a sqlite-vec `vec0` virtual table.
//!
//! Rows are keyed by the vec0 rowid. The synchronous `*_in` functions take a
//! plain connection so they can run inside a record-update transaction; the
//! async methods wrap them for standalone use.

use rusqlite::{Connection, params};
use tracing::{debug, info};

use indexsync_core::Database;
use indexsync_core::sql::{quote_ident, table_exists};
use indexsync_protocols::{Embedding, StoreError};

/// Name of the embeddings table companion to a collection.
pub fn embeddings_table(collection: &str) -> String {
    format!("{}_embeddings", collection)
}

/// One `<collection>_embeddings` table.
#[derive(Clone)]
pub struct EmbeddingStore {
    db: Database,
    table: String,
}

impl EmbeddingStore {
    pub fn new(db: Database, collection: &str) -> Self {
        Self {
            db,
            table: embeddings_table(collection),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the table if it does not exist.
    pub async fn ensure(&self, dimension: usize) -> Result<(), StoreError> {
        let table = self.table.clone();
        self.db
            .call(move |conn| Ok(Self::ensure_in(conn, &table, dimension)?))
            .await
            .map_err(|e| StoreError::Schema(e.to_string()))
    }

    pub async fn insert(&self, embedding: &Embedding) -> Result<i64, StoreError> {
        let table = self.table.clone();
        let blob = embedding.to_blob();
        self.db
            .call(move |conn| Ok(Self::insert_in(conn, &table, &blob)?))
            .await
    }

    /// Delete a row. Returns whether a row was removed.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let table = self.table.clone();
        self.db
            .call(move |conn| Ok(Self::delete_in(conn, &table, id)?))
            .await
    }

    /// Up to `k` nearest rows, ascending distance.
    pub async fn knn(&self, query: &Embedding, k: usize) -> Result<Vec<(i64, f64)>, StoreError> {
        let table = self.table.clone();
        let blob = query.to_blob();
        self.db
            .call(move |conn| Ok(Self::knn_in(conn, &table, &blob, k)?))
            .await
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&self.table));
        self.db
            .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
            .await
    }

    pub async fn contains(&self, id: i64) -> Result<bool, StoreError> {
        let table = self.table.clone();
        self.db
            .call(move |conn| Ok(Self::contains_in(conn, &table, id)?))
            .await
    }

    /// Stored vector for a row.
    pub async fn get(&self, id: i64) -> Result<Option<Embedding>, StoreError> {
        let sql = format!(
            "SELECT embedding FROM {} WHERE rowid = ?1",
            quote_ident(&self.table)
        );
        let blob: Option<Vec<u8>> = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query([id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get(0)?)),
                    None => Ok(None),
                }
            })
            .await?;
        Ok(blob.as_deref().and_then(Embedding::from_blob))
    }

    /// Clear and drop the table.
    pub async fn drop_table(&self) -> Result<(), StoreError> {
        let table = self.table.clone();
        self.db
            .call(move |conn| Ok(Self::drop_in(conn, &table)?))
            .await
    }

    pub fn ensure_in(conn: &Connection, table: &str, dimension: usize) -> rusqlite::Result<()> {
        if table_exists(conn, table)? {
            return Ok(());
        }
        conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING vec0(embedding float[{}])",
            quote_ident(table),
            dimension
        ))?;
        info!("Created embeddings table {} ({} dims)", table, dimension);
        Ok(())
    }

    pub fn insert_in(conn: &Connection, table: &str, blob: &[u8]) -> rusqlite::Result<i64> {
        conn.execute(
            &format!("INSERT INTO {} (embedding) VALUES (?1)", quote_ident(table)),
            params![blob],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted embedding {}#{}", table, id);
        Ok(id)
    }

    pub fn contains_in(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<bool> {
        conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE rowid = ?1)",
                quote_ident(table)
            ),
            [id],
            |row| row.get(0),
        )
    }

    /// Delete a row if present; a missing row is not an error.
    pub fn delete_in(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<bool> {
        if !Self::contains_in(conn, table, id)? {
            return Ok(false);
        }
        conn.execute(
            &format!("DELETE FROM {} WHERE rowid = ?1", quote_ident(table)),
            [id],
        )?;
        debug!("Deleted embedding {}#{}", table, id);
        Ok(true)
    }

    pub fn knn_in(
        conn: &Connection,
        table: &str,
        blob: &[u8],
        k: usize,
    ) -> rusqlite::Result<Vec<(i64, f64)>> {
        let quoted = quote_ident(table);
        let has_rows: bool = conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {} LIMIT 1)", quoted),
            [],
            |row| row.get(0),
        )?;
        if !has_rows || k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT rowid, distance FROM {} WHERE embedding MATCH ?1 AND k = ?2 ORDER BY distance",
            quoted
        ))?;
        let rows = stmt
            .query_map(params![blob, k as i64], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn drop_in(conn: &Connection, table: &str) -> rusqlite::Result<()> {
        if !table_exists(conn, table)? {
            return Ok(());
        }
        let quoted = quote_ident(table);
        conn.execute_batch(&format!("DELETE FROM {0}; DROP TABLE {0};", quoted))?;
        info!("Dropped embeddings table {}", table);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
