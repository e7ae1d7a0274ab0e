//! # indexsync Full-Text Search
//!
//! Mirrors tracked collections into external-content FTS5 tables
//! (`<collection>_fts`) kept current by insert/update/delete triggers, and
//! answers ranked lexical queries against them.

mod extension;
mod schema;
mod search;
mod synchronizer;

pub use extension::{FullTextSearchConfig, FullTextSearchExtension};
pub use schema::{FtsSchema, fts_table};
pub use search::LexicalSearch;
pub use synchronizer::FtsSynchronizer;
