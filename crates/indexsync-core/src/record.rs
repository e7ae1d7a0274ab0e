//! Record storage with provenance-aware hook dispatch.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, Transaction, params_from_iter};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use indexsync_protocols::{
    CollectionDescriptor, FieldKind, FieldSchema, IndexError, Record, RecordEvent,
    RecordEventKind, WriteOrigin,
};

use crate::collection::CollectionStore;
use crate::database::Database;
use crate::hooks::HookRegistry;
use crate::sql::{quote_ident, sql_to_json};

/// Keys accepted in write payloads that are not schema fields.
const IGNORED_KEYS: [&str; 4] = ["id", "collectionName", "created", "updated"];

/// Reads and writes records of any collection.
///
/// Every write carries a [`WriteOrigin`]; only [`WriteOrigin::User`] writes
/// are dispatched to the record hooks registered for the collection.
#[derive(Clone)]
pub struct RecordStore {
    db: Database,
    collections: CollectionStore,
    hooks: Arc<HookRegistry>,
}

impl RecordStore {
    pub fn new(db: Database, collections: CollectionStore, hooks: Arc<HookRegistry>) -> Self {
        Self {
            db,
            collections,
            hooks,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn collections(&self) -> &CollectionStore {
        &self.collections
    }

    pub async fn find(&self, collection: &str, id: &str) -> Result<Option<Record>, IndexError> {
        let descriptor = self.collections.get(collection).await?;
        let id = id.to_string();
        let record = self
            .db
            .call(move |conn| Ok(read_record(conn, &descriptor, &id)?))
            .await?;
        Ok(record)
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Record, IndexError> {
        self.find(collection, id)
            .await?
            .ok_or_else(|| IndexError::not_found(format!("record '{}' in '{}'", id, collection)))
    }

    /// All records of a collection in insertion order.
    pub async fn list(&self, collection: &str) -> Result<Vec<Record>, IndexError> {
        let descriptor = self.collections.get(collection).await?;
        let records = self
            .db
            .call(move |conn| {
                let sql = format!(
                    "SELECT * FROM {} ORDER BY rowid",
                    quote_ident(&descriptor.name)
                );
                let mut stmt = conn.prepare(&sql)?;
                let columns = crate::sql::column_names(&stmt);
                let records = stmt
                    .query_map([], |row| row_to_record(row, &columns, &descriptor))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    /// Insert a record. An `id` in `fields` is used when present.
    pub async fn create(
        &self,
        collection: &str,
        fields: Map<String, Value>,
        origin: WriteOrigin,
    ) -> Result<Record, IndexError> {
        let descriptor = self.collections.get(collection).await?;
        self.reject_owned_fields(&descriptor.name, &fields, origin)?;
        let id = match fields.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Null) | None => uuid::Uuid::new_v4().to_string(),
            Some(_) => return Err(IndexError::validation("id must be a non-empty string")),
        };
        let values = to_columns(&descriptor, &fields)?;
        check_required(&descriptor, &values, true)?;

        let d = descriptor.clone();
        let record_id = id.clone();
        let record = self
            .db
            .call(move |conn| {
                let now = Utc::now().to_rfc3339();
                let mut columns = vec![
                    quote_ident("id"),
                    quote_ident("created"),
                    quote_ident("updated"),
                ];
                let mut params = vec![
                    SqlValue::Text(record_id.clone()),
                    SqlValue::Text(now.clone()),
                    SqlValue::Text(now),
                ];
                for (name, value) in values {
                    columns.push(quote_ident(&name));
                    params.push(value);
                }
                let placeholders = (1..=params.len())
                    .map(|i| format!("?{}", i))
                    .collect::<Vec<_>>()
                    .join(", ");
                conn.execute(
                    &format!(
                        "INSERT INTO {} ({}) VALUES ({})",
                        quote_ident(&d.name),
                        columns.join(", "),
                        placeholders
                    ),
                    params_from_iter(params),
                )?;
                Ok(read_record(conn, &d, &record_id)?)
            })
            .await?
            .ok_or_else(|| IndexError::not_found(format!("record '{}'", id)))?;

        debug!("Created record {}/{} ({:?})", collection, record.id, origin);
        self.dispatch(RecordEventKind::Created, &record, origin).await?;
        Ok(record)
    }

    /// Patch a record's fields.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
        origin: WriteOrigin,
    ) -> Result<Record, IndexError> {
        let descriptor = self.collections.get(collection).await?;
        self.reject_owned_fields(&descriptor.name, &patch, origin)?;
        let values = to_columns(&descriptor, &patch)?;
        check_required(&descriptor, &values, false)?;
        self.write_in_transaction(descriptor, id, origin, move |_, _| Ok(values))
            .await
    }

    /// Patch a record with values computed inside the same transaction.
    ///
    /// Hook-owned fields are not checked here; this is the write path of the
    /// hooks that own them.
    ///
    /// `f` receives the open transaction and the current record and returns
    /// the field patch to apply. Anything `f` writes through the transaction
    /// commits or rolls back together with the patch.
    pub async fn update_with<F>(
        &self,
        collection: &str,
        id: &str,
        origin: WriteOrigin,
        f: F,
    ) -> Result<Record, IndexError>
    where
        F: FnOnce(&Transaction<'_>, &Record) -> rusqlite::Result<Map<String, Value>>
            + Send
            + 'static,
    {
        let descriptor = self.collections.get(collection).await?;
        let d = descriptor.clone();
        self.write_in_transaction(descriptor, id, origin, move |tx, record| {
            let patch = f(tx, record)?;
            to_columns(&d, &patch)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        })
        .await
    }

    async fn write_in_transaction<F>(
        &self,
        descriptor: CollectionDescriptor,
        id: &str,
        origin: WriteOrigin,
        f: F,
    ) -> Result<Record, IndexError>
    where
        F: FnOnce(&Transaction<'_>, &Record) -> rusqlite::Result<Vec<(String, SqlValue)>>
            + Send
            + 'static,
    {
        let collection = descriptor.name.clone();
        let record_id = id.to_string();
        let updated = self
            .db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(current) = read_record(&tx, &descriptor, &record_id)? else {
                    return Ok(None);
                };
                let values = f(&tx, &current)?;

                let mut assignments = vec![format!("{} = ?1", quote_ident("updated"))];
                let mut params = vec![SqlValue::Text(Utc::now().to_rfc3339())];
                for (name, value) in values {
                    params.push(value);
                    assignments.push(format!("{} = ?{}", quote_ident(&name), params.len()));
                }
                params.push(SqlValue::Text(record_id.clone()));
                tx.execute(
                    &format!(
                        "UPDATE {} SET {} WHERE id = ?{}",
                        quote_ident(&descriptor.name),
                        assignments.join(", "),
                        params.len()
                    ),
                    params_from_iter(params),
                )?;

                let record = read_record(&tx, &descriptor, &record_id)?;
                tx.commit()?;
                Ok(record)
            })
            .await?
            .ok_or_else(|| IndexError::not_found(format!("record '{}' in '{}'", id, collection)))?;

        debug!("Updated record {}/{} ({:?})", collection, updated.id, origin);
        self.dispatch(RecordEventKind::Updated, &updated, origin).await?;
        Ok(updated)
    }

    /// Delete a record and return its last state.
    pub async fn delete(
        &self,
        collection: &str,
        id: &str,
        origin: WriteOrigin,
    ) -> Result<Record, IndexError> {
        let descriptor = self.collections.get(collection).await?;
        let record_id = id.to_string();
        let deleted = self
            .db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let record = read_record(&tx, &descriptor, &record_id)?;
                if record.is_some() {
                    tx.execute(
                        &format!("DELETE FROM {} WHERE id = ?1", quote_ident(&descriptor.name)),
                        [&record_id],
                    )?;
                }
                tx.commit()?;
                Ok(record)
            })
            .await?
            .ok_or_else(|| IndexError::not_found(format!("record '{}' in '{}'", id, collection)))?;

        debug!("Deleted record {}/{} ({:?})", collection, deleted.id, origin);
        self.dispatch(RecordEventKind::Deleted, &deleted, origin).await?;
        Ok(deleted)
    }

    /// User writes may not set fields maintained by a record hook.
    fn reject_owned_fields(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
        origin: WriteOrigin,
    ) -> Result<(), IndexError> {
        if origin != WriteOrigin::User {
            return Ok(());
        }
        match self
            .hooks
            .owned_fields(collection)
            .into_iter()
            .find(|name| fields.contains_key(*name))
        {
            Some(name) => Err(IndexError::validation(format!(
                "field '{}' is maintained by the index and cannot be written",
                name
            ))),
            None => Ok(()),
        }
    }

    async fn dispatch(
        &self,
        kind: RecordEventKind,
        record: &Record,
        origin: WriteOrigin,
    ) -> Result<(), IndexError> {
        if !origin.dispatches_hooks() {
            return Ok(());
        }
        let hooks = self.hooks.record_hooks(&record.collection);
        if hooks.is_empty() {
            return Ok(());
        }

        let event = RecordEvent::new(kind, record.clone());
        for hook in hooks {
            hook.on_record(&event, self).await.inspect_err(|e| {
                warn!(
                    "Record hook '{}' failed for {:?} {}/{}: {}",
                    hook.name(),
                    kind,
                    record.collection,
                    record.id,
                    e
                )
            })?;
        }
        Ok(())
    }
}

/// Read one record by id.
pub fn read_record(
    conn: &rusqlite::Connection,
    descriptor: &CollectionDescriptor,
    id: &str,
) -> rusqlite::Result<Option<Record>> {
    let sql = format!("SELECT * FROM {} WHERE id = ?1", quote_ident(&descriptor.name));
    let mut stmt = conn.prepare(&sql)?;
    let columns = crate::sql::column_names(&stmt);
    stmt.query_row([id], |row| row_to_record(row, &columns, descriptor))
        .optional()
}

fn row_to_record(
    row: &rusqlite::Row<'_>,
    columns: &[String],
    descriptor: &CollectionDescriptor,
) -> rusqlite::Result<Record> {
    let mut record = Record::new(String::new(), descriptor.name.clone());
    for (i, column) in columns.iter().enumerate() {
        match column.as_str() {
            "id" => record.id = row.get(i)?,
            "created" => record.created = row.get(i)?,
            "updated" => record.updated = row.get(i)?,
            name => {
                let raw = sql_to_json(row.get_ref(i)?);
                let value = match descriptor.field(name) {
                    Some(field) => typed_json(&field.kind, raw),
                    None => raw,
                };
                record.fields.insert(name.to_string(), value);
            }
        }
    }
    Ok(record)
}

fn typed_json(kind: &FieldKind, raw: Value) -> Value {
    match (kind, raw) {
        (FieldKind::Bool, Value::Number(n)) => Value::Bool(n.as_i64().unwrap_or(0) != 0),
        (FieldKind::Json, Value::String(s)) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        (_, raw) => raw,
    }
}

/// Validate a write payload against the schema and convert it to columns.
fn to_columns(
    descriptor: &CollectionDescriptor,
    fields: &Map<String, Value>,
) -> Result<Vec<(String, SqlValue)>, IndexError> {
    let mut columns = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        if IGNORED_KEYS.contains(&name.as_str()) {
            continue;
        }
        let field = descriptor.field(name).ok_or_else(|| {
            IndexError::validation(format!(
                "unknown field '{}' in collection '{}'",
                name, descriptor.name
            ))
        })?;
        columns.push((name.clone(), to_sql(field, value)?));
    }
    Ok(columns)
}

fn to_sql(field: &FieldSchema, value: &Value) -> Result<SqlValue, IndexError> {
    let invalid = || {
        IndexError::validation(format!(
            "invalid value for {} field '{}'",
            field.kind.sql_type().to_lowercase(),
            field.name
        ))
    };
    Ok(match (&field.kind, value) {
        (_, Value::Null) => SqlValue::Null,
        (FieldKind::Text | FieldKind::Relation { .. }, Value::String(s)) => SqlValue::Text(s.clone()),
        (FieldKind::Number, Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).ok_or_else(invalid)?,
        },
        (FieldKind::Number, Value::String(s)) => {
            let n: f64 = s.trim().parse().map_err(|_| invalid())?;
            if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                SqlValue::Integer(n as i64)
            } else {
                SqlValue::Real(n)
            }
        }
        (FieldKind::Bool, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        (FieldKind::Json, v) => SqlValue::Text(v.to_string()),
        _ => return Err(invalid()),
    })
}

fn check_required(
    descriptor: &CollectionDescriptor,
    values: &[(String, SqlValue)],
    creating: bool,
) -> Result<(), IndexError> {
    for field in descriptor.fields.iter().filter(|f| f.required) {
        let value = values.iter().find(|(name, _)| name == &field.name);
        let missing = match value {
            None => creating,
            Some((_, SqlValue::Null)) => true,
            Some((_, SqlValue::Text(s))) => s.is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(IndexError::validation(format!(
                "field '{}' is required",
                field.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
