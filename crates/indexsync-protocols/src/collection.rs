//! Collection descriptors.

use serde::{Deserialize, Serialize};

/// Field type of a collection column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    Json,
    /// Reference to a record in another collection, by collection id.
    Relation {
        #[serde(rename = "collectionId")]
        collection_id: String,
    },
}

impl FieldKind {
    /// Column type used in the collection table.
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::Relation { .. } => "TEXT",
            FieldKind::Number => "NUMERIC",
            FieldKind::Bool => "BOOLEAN",
            FieldKind::Json => "JSON",
        }
    }
}

/// A schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,

    #[serde(flatten)]
    pub kind: FieldKind,

    #[serde(default)]
    pub required: bool,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Collection name plus field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// Assigned by the collection store on creation.
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldSchema>,

    /// `CREATE [UNIQUE] INDEX` statements applied to the collection table.
    #[serde(default)]
    pub indexes: Vec<String>,
}

impl CollectionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.indexes.push(index.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Schema field names, preceded by `id` unless already present.
    pub fn column_names(&self, primary_key: &str) -> Vec<String> {
        let mut columns = vec![primary_key.to_string()];
        columns.extend(
            self.fields
                .iter()
                .filter(|f| f.name != primary_key)
                .map(|f| f.name.clone()),
        );
        columns
    }
}

/// Kind of collection schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEventKind {
    Created,
    /// Fired before the collection table is altered.
    Updating,
    Updated,
    /// Fired before the collection table is dropped.
    Deleting,
}

/// A collection schema change.
#[derive(Debug, Clone)]
pub struct CollectionEvent {
    pub kind: CollectionEventKind,
    pub collection: CollectionDescriptor,
}

impl CollectionEvent {
    pub fn new(kind: CollectionEventKind, collection: CollectionDescriptor) -> Self {
        Self { kind, collection }
    }
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
