//! # indexsync Vector Search
//!
//! Keeps a sqlite-vec `<collection>_embeddings` table in step with every
//! tracked collection and answers k-nearest-neighbour queries against it.
//!
//! ## Components
//!
//! - [`EmbeddingStore`]: insert / delete / knn over one vec0 table
//! - [`CollectionBootstrapper`]: creates tracked collections and their tables
//! - [`LifecycleSynchronizer`]: record hook that replaces embeddings atomically
//! - [`SimilaritySearch`]: query embedding plus knn joined back to the records
//! - [`GlobalVectorStore`]: the ungrouped `vector_store` collection

mod bootstrap;
mod extension;
mod global;
mod search;
mod store;
mod synchronizer;

pub use bootstrap::{CollectionBootstrapper, ExtraField, ExtraFieldKind, TrackedCollection};
pub use extension::{VectorSearchConfig, VectorSearchExtension};
pub use global::{GLOBAL_COLLECTION, GlobalHit, GlobalVectorStore};
pub use search::{DEFAULT_K, MAX_K, SimilaritySearch};
pub use store::EmbeddingStore;
pub use synchronizer::{EmbeddingCleanup, LifecycleSynchronizer};
