//! Collection bootstrapper.

use tracing::info;

use indexsync_core::CollectionStore;
use indexsync_core::sql::quote_ident;
use indexsync_protocols::{CollectionDescriptor, FieldKind, FieldSchema, IndexError};

use crate::store::EmbeddingStore;

/// Type of an extra field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraFieldKind {
    Field(FieldKind),
    /// Relation to a collection named here, resolved to its id at bootstrap.
    RelationTo(String),
}

/// A caller-supplied field added to a tracked collection on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraField {
    pub name: String,
    pub kind: ExtraFieldKind,
    pub required: bool,
}

impl ExtraField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind: ExtraFieldKind::Field(kind),
            required: false,
        }
    }

    pub fn relation_to(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExtraFieldKind::RelationTo(collection.into()),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    async fn resolve(&self, collections: &CollectionStore) -> Result<FieldSchema, IndexError> {
        let kind = match &self.kind {
            ExtraFieldKind::Field(kind) => kind.clone(),
            ExtraFieldKind::RelationTo(target) => {
                let target = collections.get(target).await.map_err(|e| match e {
                    IndexError::NotFound(_) => IndexError::validation(format!(
                        "relation field '{}' targets missing collection '{}'",
                        self.name, target
                    )),
                    other => other,
                })?;
                FieldKind::Relation {
                    collection_id: target.id,
                }
            }
        };
        Ok(FieldSchema {
            name: self.name.clone(),
            kind,
            required: self.required,
        })
    }
}

/// A collection kept in sync with an embeddings table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedCollection {
    pub name: String,
    pub extra_fields: Vec<ExtraField>,
}

impl TrackedCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra_fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: ExtraField) -> Self {
        self.extra_fields.push(field);
        self
    }
}

fn system_fields() -> Vec<FieldSchema> {
    vec![
        FieldSchema::text("title"),
        FieldSchema::text("content").required(),
        FieldSchema::number("vector_id"),
    ]
}

/// Ensures tracked collections and their embeddings tables exist.
pub struct CollectionBootstrapper {
    collections: CollectionStore,
    dimension: usize,
}

impl CollectionBootstrapper {
    pub fn new(collections: CollectionStore, dimension: usize) -> Self {
        Self {
            collections,
            dimension,
        }
    }

    /// Idempotent. An existing collection keeps its schema except that any
    /// missing `title`, `content` or `vector_id` field is added.
    pub async fn ensure(&self, tracked: &TrackedCollection) -> Result<CollectionDescriptor, IndexError> {
        let descriptor = match self.collections.find(&tracked.name).await? {
            Some(existing) => self.add_system_fields(existing).await?,
            None => {
                let descriptor = self.descriptor(tracked).await?;
                let created = self.collections.create(descriptor).await?;
                info!("Bootstrapped vector collection '{}'", created.name);
                created
            }
        };

        EmbeddingStore::new(self.collections.database().clone(), &descriptor.name)
            .ensure(self.dimension)
            .await?;
        Ok(descriptor)
    }

    async fn add_system_fields(
        &self,
        existing: CollectionDescriptor,
    ) -> Result<CollectionDescriptor, IndexError> {
        let missing: Vec<FieldSchema> = system_fields()
            .into_iter()
            .filter(|field| existing.field(&field.name).is_none())
            .collect();
        if missing.is_empty() {
            return Ok(existing);
        }

        let names = missing
            .iter()
            .map(|field| field.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        info!("Adding {} to tracked collection '{}'", names, existing.name);
        let descriptor = missing.into_iter().fold(existing, CollectionDescriptor::with_field);
        self.collections.update(descriptor).await
    }

    async fn descriptor(&self, tracked: &TrackedCollection) -> Result<CollectionDescriptor, IndexError> {
        let mut descriptor = system_fields()
            .into_iter()
            .fold(CollectionDescriptor::new(&tracked.name), CollectionDescriptor::with_field);

        for extra in &tracked.extra_fields {
            descriptor = descriptor.with_field(extra.resolve(&self.collections).await?);
        }

        let name = quote_ident(&tracked.name);
        let index = quote_ident(&format!("idx_{}", tracked.name));
        Ok(descriptor.with_index(format!(
            "CREATE UNIQUE INDEX {} ON {} (\"title\", \"content\", \"vector_id\")",
            index, name
        )))
    }
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
