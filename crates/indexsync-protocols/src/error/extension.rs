//! Extension-related errors.

use thiserror::Error;

use super::IndexError;

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("Extension initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Hook already registered: {0}")]
    AlreadyRegistered(String),

    #[error(transparent)]
    Index(#[from] IndexError),
}

#[cfg(test)]
#[path = "extension_tests.rs"]
mod tests;
