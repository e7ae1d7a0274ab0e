//! # indexsync Protocols
//!
//! Types and traits shared by every indexsync crate.
//! Contains only definitions - storage, HTTP and provider implementations live elsewhere.
//!
//! ## Core Items
//!
//! - [`EmbeddingProvider`] - Trait for remote (or local) embedding backends
//! - [`TaskType`] - Intent hint passed through to the provider
//! - [`Record`] / [`RecordEvent`] / [`WriteOrigin`] - Record writes and their provenance
//! - [`CollectionDescriptor`] - Collection name plus field list
//! - [`IndexError`] - Error taxonomy surfaced to callers

pub mod collection;
pub mod embedding;
pub mod error;
pub mod record;
pub mod search;

pub use collection::{
    CollectionDescriptor, CollectionEvent, CollectionEventKind, FieldKind, FieldSchema,
};
pub use embedding::{EMBEDDING_DIMENSION, Embedding, EmbeddingProvider, HashEmbedding, TaskType};
pub use error::{ExtensionError, IndexError, ProviderError, StoreError};
pub use record::{Record, RecordEvent, RecordEventKind, WriteOrigin};
pub use search::SearchOutcome;
