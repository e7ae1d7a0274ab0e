//! # indexsync Provider - Gemini
//!
//! Embedding provider backed by the Google Generative Language
//! `embedContent` endpoint.

mod client;
mod provider;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiClient, GeminiClientConfig};
pub use provider::GeminiEmbedding;
pub use types::*;
