//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub vector_search: VectorSearchConfig,

    #[serde(default)]
    pub full_text_search: FullTextSearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

/// SQLite database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path. `~` is expanded.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_db_path() -> String {
    "indexsync.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Which embedding provider to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Generative Language `embedContent`.
    #[default]
    Gemini,
    /// Local deterministic hashing embedding, for offline runs.
    Hash,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            model: default_model(),
            base_url: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "text-embedding-004".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    300
}

/// Vector search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchConfig {
    /// Collections kept in sync with an embeddings table.
    #[serde(default)]
    pub collections: Vec<VectorCollectionConfig>,

    /// Enable the global `vector_store` collection and `/embed/search`.
    #[serde(default)]
    pub global_store: bool,

    /// Neighbours returned by `/embed/search`.
    #[serde(default = "default_global_k")]
    pub global_k: usize,
}

impl Default for VectorSearchConfig {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            global_store: false,
            global_k: default_global_k(),
        }
    }
}

impl VectorSearchConfig {
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|c| c.name.as_str())
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.collection_names().any(|c| c == name)
    }
}

fn default_global_k() -> usize {
    20
}

/// A vector-tracked collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorCollectionConfig {
    pub name: String,

    /// Fields added on top of `title`, `content` and `vector_id` when the
    /// collection is first created.
    #[serde(default)]
    pub extra_fields: Vec<ExtraFieldConfig>,
}

impl VectorCollectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra_fields: Vec::new(),
        }
    }
}

/// Field type for an extra field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraFieldType {
    #[default]
    Text,
    Number,
    Bool,
    Json,
    Relation,
}

/// An extra schema field for a vector-tracked collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFieldConfig {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: ExtraFieldType,

    /// Target collection name for relation fields, resolved to a collection
    /// id at bootstrap.
    #[serde(default)]
    pub relation: Option<String>,

    #[serde(default)]
    pub required: bool,
}

/// Full-text search configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullTextSearchConfig {
    /// Collections mirrored into an FTS5 table.
    #[serde(default)]
    pub collections: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated log files. Console only when unset.
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
