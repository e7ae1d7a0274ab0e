//! # indexsync API
//!
//! HTTP surface over the record store and the index extensions:
//!
//! - **Search**: `vector-search` and `full-text-search` per collection
//! - **Embedding**: `/embed/{content,document,query}` and the global `/embed/search`
//! - **Records / collections**: the CRUD needed to drive index synchronization
//! - **Health**: `/health`

pub mod error;
pub mod http;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use http::routes::create_router;
pub use server::{ApiServer, ServerConfig};
pub use state::AppState;
