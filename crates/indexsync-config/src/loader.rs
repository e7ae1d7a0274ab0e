//! Configuration loader.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::{Config, VectorCollectionConfig};

/// Environment variable holding the embedding provider API key.
pub const ENV_API_KEY: &str = "GOOGLE_AI_API_KEY";
/// Comma separated list of vector-tracked collection names.
pub const ENV_VECTOR_COLLECTIONS: &str = "INDEXSYNC_VECTOR_COLLECTIONS";
/// Comma separated list of full-text tracked collection names.
pub const ENV_FTS_COLLECTIONS: &str = "INDEXSYNC_FTS_COLLECTIONS";
/// Database path override.
pub const ENV_DB_PATH: &str = "INDEXSYNC_DB_PATH";

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let mut config = Self::load_str(&content)?;
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load configuration from a file if it exists, otherwise start from
    /// defaults. Environment overrides are applied in both cases.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load configuration from a string. No environment overrides.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(config: &mut Config) {
        Self::apply_overrides(config, |key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup.
    ///
    /// Collection lists replace the configured names; a name that was already
    /// configured keeps its extra fields.
    pub fn apply_overrides<F>(config: &mut Config, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            config.provider.api_key = Some(key);
        }

        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.is_empty()) {
            config.database.path = path;
        }

        if let Some(list) = lookup(ENV_VECTOR_COLLECTIONS) {
            let existing = std::mem::take(&mut config.vector_search.collections);
            config.vector_search.collections = split_list(&list)
                .map(|name| {
                    existing
                        .iter()
                        .find(|c| c.name == name)
                        .cloned()
                        .unwrap_or_else(|| VectorCollectionConfig::new(name))
                })
                .collect();
        }

        if let Some(list) = lookup(ENV_FTS_COLLECTIONS) {
            config.full_text_search.collections = split_list(&list).map(String::from).collect();
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidValue {
            field: "env pattern".to_string(),
            message: e.to_string(),
        })?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.local/share`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
