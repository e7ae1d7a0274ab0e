//! Records and record write events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a record write came from.
///
/// Index-maintenance code writes with [`WriteOrigin::Synchronizer`]; those
/// writes never re-enter the lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOrigin {
    User,
    Synchronizer,
}

impl WriteOrigin {
    /// Whether a write with this origin should be dispatched to record hooks.
    pub fn dispatches_hooks(self) -> bool {
        matches!(self, WriteOrigin::User)
    }
}

/// A row in a collection table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,

    #[serde(rename = "collectionName")]
    pub collection: String,

    pub created: String,

    pub updated: String,

    /// Schema field values keyed by field name.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            created: String::new(),
            updated: String::new(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String value of a field; empty when absent, null or not a string.
    pub fn get_str(&self, name: &str) -> &str {
        self.fields.get(name).and_then(Value::as_str).unwrap_or("")
    }

    /// Integer value of a numeric field. Whole floats are accepted.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.fields.get(name)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }
}

/// Kind of record write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordEventKind {
    Created,
    Updated,
    Deleted,
}

/// A completed user-originated record write.
#[derive(Debug, Clone)]
pub struct RecordEvent {
    pub kind: RecordEventKind,
    /// Record state after the write (before it, for deletes).
    pub record: Record,
}

impl RecordEvent {
    pub fn new(kind: RecordEventKind, record: Record) -> Self {
        Self { kind, record }
    }

    pub fn collection(&self) -> &str {
        &self.record.collection
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
