//! Provider construction and extension configuration from the config file.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::info;

use indexsync_config::{
    Config, ExtraFieldConfig, ExtraFieldType, ProviderConfig, ProviderKind,
    VectorCollectionConfig,
};
use indexsync_full_text_search::FullTextSearchConfig;
use indexsync_protocols::{EmbeddingProvider, FieldKind, HashEmbedding};
use indexsync_provider_gemini::{GeminiClientConfig, GeminiEmbedding};
use indexsync_vector_search::{ExtraField, TrackedCollection, VectorSearchConfig};

/// Build the configured embedding provider.
pub(crate) fn build_provider(config: &ProviderConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match config.kind {
        ProviderKind::Gemini => {
            let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
                bail!("provider.api_key is required for the gemini provider");
            };
            let mut client = GeminiClientConfig::new(api_key)
                .with_model(config.model.clone())
                .with_timeouts(
                    Duration::from_secs(config.connect_timeout_secs),
                    Duration::from_secs(config.request_timeout_secs),
                );
            if let Some(base_url) = &config.base_url {
                client = client.with_base_url(base_url.clone());
            }
            let provider = GeminiEmbedding::new(client).context("building gemini provider")?;
            info!("Embedding provider: gemini ({})", config.model);
            Ok(Arc::new(provider))
        }
        ProviderKind::Hash => {
            info!("Embedding provider: hash");
            Ok(Arc::new(HashEmbedding::default()))
        }
    }
}

pub(crate) fn vector_search_config(config: &Config) -> VectorSearchConfig {
    let mut vector = VectorSearchConfig::default();
    for collection in &config.vector_search.collections {
        vector = vector.track(tracked_collection(collection));
    }
    if config.vector_search.global_store {
        vector = vector.with_global_store(config.vector_search.global_k);
    }
    vector
}

pub(crate) fn full_text_search_config(config: &Config) -> FullTextSearchConfig {
    FullTextSearchConfig::new(config.full_text_search.collections.iter().cloned())
}

fn tracked_collection(config: &VectorCollectionConfig) -> TrackedCollection {
    config
        .extra_fields
        .iter()
        .map(extra_field)
        .fold(TrackedCollection::new(&config.name), TrackedCollection::with_field)
}

fn extra_field(config: &ExtraFieldConfig) -> ExtraField {
    let field = match (config.kind, &config.relation) {
        (ExtraFieldType::Relation, Some(target)) => ExtraField::relation_to(&config.name, target),
        // The validator rejects relations without a target.
        (ExtraFieldType::Relation, None) | (ExtraFieldType::Text, _) => {
            ExtraField::new(&config.name, FieldKind::Text)
        }
        (ExtraFieldType::Number, _) => ExtraField::new(&config.name, FieldKind::Number),
        (ExtraFieldType::Bool, _) => ExtraField::new(&config.name, FieldKind::Bool),
        (ExtraFieldType::Json, _) => ExtraField::new(&config.name, FieldKind::Json),
    };
    if config.required { field.required() } else { field }
}

#[cfg(test)]
#[path = "register_tests.rs"]
mod tests;
