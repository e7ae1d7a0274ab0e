//! Errors surfaced by index synchronization and search.

use thiserror::Error;

use super::{ProviderError, StoreError};

/// Failure taxonomy for writes and searches.
///
/// Every variant is returned to the caller; nothing in the write or search
/// path swallows errors and nothing is retried.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Remote embedding call failed or returned malformed data.
    #[error("Embedding provider error: {0}")]
    Provider(#[from] ProviderError),

    /// SQL or index statement failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Missing or empty required input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced collection or record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IndexError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
