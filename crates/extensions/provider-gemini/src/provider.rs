//! Gemini embedding provider.

use async_trait::async_trait;
use tracing::debug;

use indexsync_protocols::{Embedding, EmbeddingProvider, ProviderError, TaskType};

use crate::client::{GeminiClient, GeminiClientConfig};
use crate::types::{Content, EmbedContentRequest};

/// Embedding provider for `text-embedding-004` and compatible models.
pub struct GeminiEmbedding {
    client: GeminiClient,
    dimension: usize,
}

impl GeminiEmbedding {
    pub fn new(config: GeminiClientConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: GeminiClient::new(config)?,
            dimension: indexsync_protocols::EMBEDDING_DIMENSION,
        })
    }

    /// Create a provider with default settings.
    pub fn from_api_key(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(GeminiClientConfig::new(api_key))
    }

    /// Override the expected vector length.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    fn build_request(&self, task: TaskType, title: &str, content: &str) -> EmbedContentRequest {
        EmbedContentRequest {
            model: format!("models/{}", self.client.model()),
            content: Content::text(content),
            task_type: (task != TaskType::Unspecified).then(|| task.wire_name().to_string()),
            title: (!title.is_empty()).then(|| title.to_string()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    fn id(&self) -> &str {
        "gemini"
    }

    async fn embed(
        &self,
        task: TaskType,
        title: &str,
        content: &str,
    ) -> Result<Embedding, ProviderError> {
        let request = self.build_request(task, title, content);
        let response = self.client.embed_content(&request).await?;

        let values = response.embedding.values;
        if values.is_empty() {
            return Err(ProviderError::MalformedResponse(
                "embedding has no values".to_string(),
            ));
        }

        let embedding = Embedding::new(values);
        embedding.check_dimension(self.dimension)?;
        debug!("Embedded {} chars as {} ({} dims)", content.len(), task, self.dimension);
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
