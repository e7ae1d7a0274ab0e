//! Error types for the indexsync protocol layer.

mod extension;
mod index;
mod provider;
mod store;

pub use extension::*;
pub use index::*;
pub use provider::*;
pub use store::*;
