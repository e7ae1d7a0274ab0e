//! FTS5 mirror schema: the virtual table and its three triggers.
//!
//! The virtual table uses the collection table as external content, so
//! tokens are stored in the index while the row values are read back from
//! the collection. Triggers address rows by rowid.

use rusqlite::Connection;
use tracing::{debug, info};

use indexsync_core::sql::{quote_ident, table_exists};
use indexsync_protocols::CollectionDescriptor;

/// Name of the FTS mirror of a collection.
pub fn fts_table(collection: &str) -> String {
    format!("{}_fts", collection)
}

const TRIGGER_SUFFIXES: [&str; 3] = ["insert", "update", "delete"];

/// DDL for one collection's mirror.
#[derive(Debug, Clone)]
pub struct FtsSchema {
    collection: String,
    table: String,
    columns: Vec<String>,
}

impl FtsSchema {
    /// Indexed columns are `id` plus every schema field.
    pub fn new(descriptor: &CollectionDescriptor) -> Self {
        Self {
            collection: descriptor.name.clone(),
            table: fts_table(&descriptor.name),
            columns: descriptor.column_names("id"),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn trigger(&self, suffix: &str) -> String {
        quote_ident(&format!("{}_{}", self.table, suffix))
    }

    fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn prefixed(&self, prefix: &str) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}.{}", prefix, quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `CREATE VIRTUAL TABLE` plus the triggers, as one batch.
    pub fn create_sql(&self) -> String {
        let table = quote_ident(&self.table);
        let source = quote_ident(&self.collection);
        let columns = self.column_list();
        let new_values = self.prefixed("new");
        let old_values = self.prefixed("old");

        format!(
            r#"
CREATE VIRTUAL TABLE {table} USING fts5({columns}, content='{collection}', content_rowid='rowid');

CREATE TRIGGER {insert} AFTER INSERT ON {source} BEGIN
    INSERT INTO {table}(rowid, {columns}) VALUES (new.rowid, {new_values});
END;

CREATE TRIGGER {delete} AFTER DELETE ON {source} BEGIN
    INSERT INTO {table}({table}, rowid, {columns}) VALUES ('delete', old.rowid, {old_values});
END;

CREATE TRIGGER {update} AFTER UPDATE ON {source} BEGIN
    INSERT INTO {table}({table}, rowid, {columns}) VALUES ('delete', old.rowid, {old_values});
    INSERT INTO {table}(rowid, {columns}) VALUES (new.rowid, {new_values});
END;
"#,
            collection = self.collection,
            insert = self.trigger("insert"),
            delete = self.trigger("delete"),
            update = self.trigger("update"),
        )
    }

    /// Create the mirror unless it already exists. Returns whether it was
    /// created.
    pub fn create_in(&self, conn: &Connection) -> rusqlite::Result<bool> {
        if table_exists(conn, &self.table)? {
            debug!("FTS table {} already exists", self.table);
            return Ok(false);
        }
        conn.execute_batch(&self.create_sql())?;
        info!(
            "Created FTS table {} over {:?}",
            self.table, self.columns
        );
        Ok(true)
    }

    /// Re-index every row of the collection from scratch.
    pub fn rebuild_in(&self, conn: &Connection) -> rusqlite::Result<()> {
        let table = quote_ident(&self.table);
        conn.execute(
            &format!("INSERT INTO {table}({table}) VALUES ('rebuild')"),
            [],
        )?;
        debug!("Rebuilt FTS table {}", self.table);
        Ok(())
    }

    /// Drop the triggers, clear and drop the mirror. A missing mirror is a
    /// no-op.
    pub fn drop_in(conn: &Connection, collection: &str) -> rusqlite::Result<()> {
        let table = fts_table(collection);
        for suffix in TRIGGER_SUFFIXES {
            conn.execute_batch(&format!(
                "DROP TRIGGER IF EXISTS {}",
                quote_ident(&format!("{}_{}", table, suffix))
            ))?;
        }
        if table_exists(conn, &table)? {
            let quoted = quote_ident(&table);
            conn.execute(
                &format!("INSERT INTO {quoted}({quoted}) VALUES ('delete-all')"),
                [],
            )?;
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {quoted}"))?;
            info!("Dropped FTS table {}", table);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
