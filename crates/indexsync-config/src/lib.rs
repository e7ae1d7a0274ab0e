//! # indexsync Config
//!
//! TOML configuration for the indexsync server: schema, loader and validator.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::{
    ConfigLoader, ENV_API_KEY, ENV_DB_PATH, ENV_FTS_COLLECTIONS, ENV_VECTOR_COLLECTIONS,
};
pub use schema::*;
pub use validator::{
    ConfigValidator, GLOBAL_STORE_COLLECTION, ValidationError, ValidationResult, ValidationWarning,
};
