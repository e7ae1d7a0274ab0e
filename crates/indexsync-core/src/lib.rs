//! # indexsync Core
//!
//! The record host the index synchronizers plug into:
//!
//! - [`Database`]: a `tokio-rusqlite` connection with sqlite-vec registered
//! - [`CollectionStore`]: collection schema management
//! - [`RecordStore`]: record writes with provenance-aware hook dispatch
//! - [`HookRegistry`]: per-collection record hooks and collection hooks
//! - [`Extension`]: initialization entry point for index extensions

pub mod collection;
pub mod database;
pub mod extension;
pub mod hooks;
pub mod record;
pub mod sql;

pub use collection::CollectionStore;
pub use database::Database;
pub use extension::{Extension, ExtensionContext, ExtensionManifest};
pub use hooks::{CollectionHook, HookRegistry, RecordHook};
pub use record::RecordStore;
