//! Collection schema management.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use tracing::{info, warn};

use indexsync_protocols::{
    CollectionDescriptor, CollectionEvent, CollectionEventKind, FieldKind, FieldSchema, IndexError,
    StoreError,
};

use crate::database::Database;
use crate::hooks::HookRegistry;
use crate::sql::{quote_ident, validate_identifier};

/// Columns every collection table carries outside its schema fields.
pub const SYSTEM_FIELDS: [&str; 3] = ["id", "created", "updated"];

/// Creates, alters and drops collection tables and their metadata.
#[derive(Clone)]
pub struct CollectionStore {
    db: Database,
    hooks: Arc<HookRegistry>,
}

impl CollectionStore {
    pub fn new(db: Database, hooks: Arc<HookRegistry>) -> Self {
        Self { db, hooks }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Look up a collection by name or id.
    pub async fn find(&self, name_or_id: &str) -> Result<Option<CollectionDescriptor>, IndexError> {
        let key = name_or_id.to_string();
        let found = self
            .db
            .call(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT id, name, fields, indexes FROM _collections WHERE name = ?1 OR id = ?1",
                        [&key],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, String>(3)?,
                            ))
                        },
                    )
                    .optional()?)
            })
            .await?;

        found
            .map(|(id, name, fields, indexes)| {
                Ok(CollectionDescriptor {
                    id,
                    name,
                    fields: serde_json::from_str(&fields)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?,
                    indexes: serde_json::from_str(&indexes)
                        .map_err(|e| StoreError::Serialization(e.to_string()))?,
                })
            })
            .transpose()
            .map_err(|e: StoreError| e.into())
    }

    /// Like [`find`](Self::find) but a missing collection is an error.
    pub async fn get(&self, name_or_id: &str) -> Result<CollectionDescriptor, IndexError> {
        self.find(name_or_id)
            .await?
            .ok_or_else(|| IndexError::not_found(format!("collection '{}'", name_or_id)))
    }

    pub async fn list(&self) -> Result<Vec<CollectionDescriptor>, IndexError> {
        let names = self
            .db
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT name FROM _collections ORDER BY created, name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await?;

        let mut collections = Vec::with_capacity(names.len());
        for name in names {
            collections.push(self.get(&name).await?);
        }
        Ok(collections)
    }

    /// Create a collection table and dispatch [`CollectionEventKind::Created`].
    pub async fn create(
        &self,
        mut descriptor: CollectionDescriptor,
    ) -> Result<CollectionDescriptor, IndexError> {
        self.validate(&descriptor).await?;
        if self.find(&descriptor.name).await?.is_some() {
            return Err(IndexError::validation(format!(
                "collection '{}' already exists",
                descriptor.name
            )));
        }

        if descriptor.id.is_empty() {
            descriptor.id = uuid::Uuid::new_v4().simple().to_string();
        }
        let fields = serialize(&descriptor.fields)?;
        let indexes = serialize(&descriptor.indexes)?;
        let create_sql = create_table_sql(&descriptor);
        let d = descriptor.clone();

        self.db
            .call(move |conn| {
                let now = Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                tx.execute_batch(&create_sql)?;
                for index in &d.indexes {
                    tx.execute_batch(index)?;
                }
                tx.execute(
                    "INSERT INTO _collections (id, name, fields, indexes, created, updated)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![d.id, d.name, fields, indexes, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await?;

        info!("Created collection '{}'", descriptor.name);
        self.dispatch(CollectionEventKind::Created, &descriptor).await?;
        Ok(descriptor)
    }

    /// Replace a collection's fields and indexes.
    ///
    /// Removed fields are dropped, new fields added; a changed field type only
    /// changes the stored descriptor. Hooks see `Updating` with the old schema
    /// before the table is altered and `Updated` with the new one afterwards.
    pub async fn update(
        &self,
        mut descriptor: CollectionDescriptor,
    ) -> Result<CollectionDescriptor, IndexError> {
        let key = if descriptor.id.is_empty() {
            descriptor.name.clone()
        } else {
            descriptor.id.clone()
        };
        let current = self.get(&key).await?;
        if current.name != descriptor.name {
            return Err(IndexError::validation("renaming collections is not supported"));
        }
        descriptor.id = current.id.clone();
        self.validate(&descriptor).await?;

        self.dispatch(CollectionEventKind::Updating, &current).await?;

        match self.alter(&current, &descriptor).await {
            Ok(()) => {
                info!("Updated collection '{}'", descriptor.name);
                self.dispatch(CollectionEventKind::Updated, &descriptor).await?;
                Ok(descriptor)
            }
            Err(e) => {
                warn!("Updating collection '{}' failed: {}", descriptor.name, e);
                // Hooks tore down state for the old schema; let them restore it.
                if let Err(restore) = self.dispatch(CollectionEventKind::Updated, &current).await {
                    warn!("Restoring hooks for '{}' failed: {}", current.name, restore);
                }
                Err(e)
            }
        }
    }

    async fn alter(
        &self,
        current: &CollectionDescriptor,
        next: &CollectionDescriptor,
    ) -> Result<(), IndexError> {
        let table = quote_ident(&next.name);
        let mut statements = Vec::new();

        let next_names: HashSet<&str> = next.fields.iter().map(|f| f.name.as_str()).collect();
        let current_names: HashSet<&str> = current.fields.iter().map(|f| f.name.as_str()).collect();
        for field in &current.fields {
            if !next_names.contains(field.name.as_str()) {
                statements.push(format!(
                    "ALTER TABLE {} DROP COLUMN {}",
                    table,
                    quote_ident(&field.name)
                ));
            }
        }
        for field in &next.fields {
            if !current_names.contains(field.name.as_str()) {
                statements.push(format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    table,
                    column_def(field)
                ));
            }
        }

        let fields = serialize(&next.fields)?;
        let indexes_json = serialize(&next.indexes)?;
        let indexes = next.indexes.clone();
        let name = next.name.clone();

        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let existing: Vec<String> = {
                    let mut stmt = tx.prepare(
                        "SELECT name FROM sqlite_master
                         WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL",
                    )?;
                    let names = stmt
                        .query_map([&name], |row| row.get(0))?
                        .collect::<Result<_, _>>()?;
                    names
                };
                for index in existing {
                    tx.execute_batch(&format!("DROP INDEX IF EXISTS {}", quote_ident(&index)))?;
                }
                for statement in &statements {
                    tx.execute_batch(statement)?;
                }
                for index in &indexes {
                    tx.execute_batch(index)?;
                }
                tx.execute(
                    "UPDATE _collections SET fields = ?1, indexes = ?2, updated = ?3 WHERE name = ?4",
                    params![fields, indexes_json, Utc::now().to_rfc3339(), name],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Drop a collection table. Hooks see `Deleting` before the drop and can
    /// veto it by returning an error.
    pub async fn delete(&self, name_or_id: &str) -> Result<(), IndexError> {
        let descriptor = self.get(name_or_id).await?;
        self.dispatch(CollectionEventKind::Deleting, &descriptor).await?;

        let name = descriptor.name.clone();
        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(&name)))?;
                tx.execute("DELETE FROM _collections WHERE name = ?1", [&name])?;
                tx.commit()?;
                Ok(())
            })
            .await?;

        info!("Deleted collection '{}'", descriptor.name);
        Ok(())
    }

    async fn validate(&self, descriptor: &CollectionDescriptor) -> Result<(), IndexError> {
        validate_identifier(&descriptor.name)?;
        if descriptor.name.starts_with('_') {
            return Err(IndexError::validation("collection names starting with '_' are reserved"));
        }

        let mut seen = HashSet::new();
        for field in &descriptor.fields {
            validate_identifier(&field.name)?;
            if SYSTEM_FIELDS.contains(&field.name.as_str()) {
                return Err(IndexError::validation(format!(
                    "field name '{}' is reserved",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(IndexError::validation(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }
            if let FieldKind::Relation { collection_id } = &field.kind {
                if collection_id != &descriptor.id && self.find(collection_id).await?.is_none() {
                    return Err(IndexError::validation(format!(
                        "field '{}' references unknown collection '{}'",
                        field.name, collection_id
                    )));
                }
            }
        }

        for index in &descriptor.indexes {
            let upper = index.trim_start().to_ascii_uppercase();
            if !upper.starts_with("CREATE INDEX") && !upper.starts_with("CREATE UNIQUE INDEX") {
                return Err(IndexError::validation(format!("not an index statement: {}", index)));
            }
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        kind: CollectionEventKind,
        descriptor: &CollectionDescriptor,
    ) -> Result<(), IndexError> {
        let event = CollectionEvent::new(kind, descriptor.clone());
        for hook in self.hooks.collection_hooks() {
            hook.on_collection(&event, &self.db).await.inspect_err(|e| {
                warn!(
                    "Collection hook '{}' failed for {:?} '{}': {}",
                    hook.name(),
                    kind,
                    descriptor.name,
                    e
                )
            })?;
        }
        Ok(())
    }
}

fn serialize<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn column_def(field: &FieldSchema) -> String {
    format!("{} {}", quote_ident(&field.name), field.kind.sql_type())
}

fn create_table_sql(descriptor: &CollectionDescriptor) -> String {
    let mut columns = vec![
        "\"id\" TEXT PRIMARY KEY NOT NULL".to_string(),
        "\"created\" TEXT NOT NULL DEFAULT ''".to_string(),
        "\"updated\" TEXT NOT NULL DEFAULT ''".to_string(),
    ];
    columns.extend(descriptor.fields.iter().map(column_def));
    format!(
        "CREATE TABLE {} ({})",
        quote_ident(&descriptor.name),
        columns.join(", ")
    )
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
