//! Configuration validation.

use std::collections::HashSet;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::{Config, ExtraFieldType, ProviderKind};

/// Name of the collection backing the global vector store.
pub const GLOBAL_STORE_COLLECTION: &str = "vector_store";

/// Field names every vector-tracked collection already carries.
const RESERVED_FIELDS: [&str; 6] = ["id", "created", "updated", "title", "content", "vector_id"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| {
            ConfigError::InvalidValue {
                field: "identifier pattern".to_string(),
                message: e.to_string(),
            }
        })?;
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_provider(config, &mut result);
        Self::validate_vector_search(config, &ident, &mut result);
        Self::validate_full_text_search(config, &ident, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }

        if config.database.path.is_empty() {
            result.add_error(ValidationError::new(
                "database.path",
                "Database path cannot be empty",
            ));
        }
    }

    fn validate_provider(config: &Config, result: &mut ValidationResult) {
        let provider = &config.provider;
        if provider.kind == ProviderKind::Gemini
            && provider.api_key.as_deref().is_none_or(str::is_empty)
        {
            result.add_error(ValidationError::new(
                "provider.api_key",
                "API key is required for the gemini provider (set GOOGLE_AI_API_KEY)",
            ));
        }

        if let Some(ref url) = provider.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                result.add_error(ValidationError::new(
                    "provider.base_url",
                    "base_url must start with http:// or https://",
                ));
            }
        }

        if provider.model.is_empty() {
            result.add_error(ValidationError::new("provider.model", "Model cannot be empty"));
        }
    }

    fn validate_vector_search(config: &Config, ident: &Regex, result: &mut ValidationResult) {
        let vector = &config.vector_search;
        let mut seen = HashSet::new();

        for (i, collection) in vector.collections.iter().enumerate() {
            let path = format!("vector_search.collections[{}]", i);
            if !ident.is_match(&collection.name) {
                result.add_error(ValidationError::new(
                    format!("{}.name", path),
                    format!("Invalid collection name '{}'", collection.name),
                ));
            }
            if !seen.insert(collection.name.as_str()) {
                result.add_error(ValidationError::new(
                    format!("{}.name", path),
                    format!("Duplicate collection '{}'", collection.name),
                ));
            }
            if vector.global_store && collection.name == GLOBAL_STORE_COLLECTION {
                result.add_error(ValidationError::new(
                    format!("{}.name", path),
                    "'vector_store' is reserved while global_store is enabled",
                ));
            }

            for (j, field) in collection.extra_fields.iter().enumerate() {
                let field_path = format!("{}.extra_fields[{}]", path, j);
                if !ident.is_match(&field.name) || RESERVED_FIELDS.contains(&field.name.as_str()) {
                    result.add_error(ValidationError::new(
                        format!("{}.name", field_path),
                        format!("Invalid or reserved field name '{}'", field.name),
                    ));
                }
                match (field.kind, &field.relation) {
                    (ExtraFieldType::Relation, None) => {
                        result.add_error(ValidationError::new(
                            format!("{}.relation", field_path),
                            "Relation fields need a target collection",
                        ));
                    }
                    (ExtraFieldType::Relation, Some(_)) | (_, None) => {}
                    (_, Some(_)) => {
                        result.add_warning(ValidationWarning::new(
                            format!("{}.relation", field_path),
                            "relation is ignored for non-relation fields",
                        ));
                    }
                }
            }
        }

        if vector.global_store && vector.global_k == 0 {
            result.add_error(ValidationError::new(
                "vector_search.global_k",
                "global_k must be greater than 0",
            ));
        }
    }

    fn validate_full_text_search(config: &Config, ident: &Regex, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for (i, name) in config.full_text_search.collections.iter().enumerate() {
            let path = format!("full_text_search.collections[{}]", i);
            if !ident.is_match(name) {
                result.add_error(ValidationError::new(
                    path.clone(),
                    format!("Invalid collection name '{}'", name),
                ));
            }
            if !seen.insert(name.as_str()) {
                result.add_error(ValidationError::new(
                    path.clone(),
                    format!("Duplicate collection '{}'", name),
                ));
            }
            let bootstrapped = config.vector_search.is_tracked(name)
                || (config.vector_search.global_store && name == GLOBAL_STORE_COLLECTION);
            if !bootstrapped {
                result.add_warning(ValidationWarning::new(
                    path,
                    format!(
                        "Collection '{}' is not vector-tracked; it is indexed once it is created",
                        name
                    ),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
