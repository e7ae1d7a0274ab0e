//! Embedding types and the provider trait.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Dimensionality of every stored embedding.
pub const EMBEDDING_DIMENSION: usize = 768;

/// Intent hint passed through to the provider to bias the embedding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskType {
    #[default]
    Unspecified,
    RetrievalQuery,
    RetrievalDocument,
    SemanticSimilarity,
    Classification,
    Clustering,
    QuestionAnswering,
    FactVerification,
}

impl TaskType {
    pub const ALL: [TaskType; 8] = [
        TaskType::Unspecified,
        TaskType::RetrievalQuery,
        TaskType::RetrievalDocument,
        TaskType::SemanticSimilarity,
        TaskType::Classification,
        TaskType::Clustering,
        TaskType::QuestionAnswering,
        TaskType::FactVerification,
    ];

    /// Name used by the Generative Language API.
    pub fn wire_name(self) -> &'static str {
        match self {
            TaskType::Unspecified => "TASK_TYPE_UNSPECIFIED",
            TaskType::RetrievalQuery => "RETRIEVAL_QUERY",
            TaskType::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            TaskType::SemanticSimilarity => "SEMANTIC_SIMILARITY",
            TaskType::Classification => "CLASSIFICATION",
            TaskType::Clustering => "CLUSTERING",
            TaskType::QuestionAnswering => "QUESTION_ANSWERING",
            TaskType::FactVerification => "FACT_VERIFICATION",
        }
    }

    /// Name accepted in request bodies and record fields.
    pub fn name(self) -> &'static str {
        match self {
            TaskType::Unspecified => "Unspecified",
            TaskType::RetrievalQuery => "RetrievalQuery",
            TaskType::RetrievalDocument => "RetrievalDocument",
            TaskType::SemanticSimilarity => "SemanticSimilarity",
            TaskType::Classification => "Classification",
            TaskType::Clustering => "Clustering",
            TaskType::QuestionAnswering => "QuestionAnswering",
            TaskType::FactVerification => "FactVerification",
        }
    }

    /// Resolve either naming style. Unknown names resolve to `Unspecified`.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name || t.wire_name() == name)
            .unwrap_or_default()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Embedding result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Vector representation.
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// Little-endian f32 bytes, the layout vec0 columns store.
    pub fn to_blob(&self) -> Vec<u8> {
        self.vector.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Decode a vec0 blob back into an embedding.
    pub fn from_blob(blob: &[u8]) -> Option<Self> {
        if blob.len() % 4 != 0 {
            return None;
        }
        let vector = blob
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Some(Self { vector })
    }

    /// Fails unless the vector has exactly `expected` components.
    pub fn check_dimension(&self, expected: usize) -> Result<(), ProviderError> {
        if self.dimension() != expected {
            return Err(ProviderError::DimensionMismatch {
                expected,
                actual: self.dimension(),
            });
        }
        Ok(())
    }
}

/// Trait for embedding providers.
///
/// Implementations hold no per-request state and are shared across
/// concurrent synchronizer and search invocations.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider identifier used in logs.
    fn id(&self) -> &str;

    /// Embed `content` (with an optional `title`, may be empty) for the given intent.
    async fn embed(
        &self,
        task: TaskType,
        title: &str,
        content: &str,
    ) -> Result<Embedding, ProviderError>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }
}

/// Deterministic bag-of-words embedding (not semantic).
///
/// Used by tests and offline runs. Title and task type are ignored so the
/// same content always yields the same vector.
pub struct HashEmbedding {
    dimension: usize,
    calls: AtomicUsize,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn hash_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }

            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let hash = hasher.finish();

            // Spread each word over a handful of dimensions
            for j in 0..4u64 {
                let idx = ((hash.rotate_left((j * 16) as u32)) % self.dimension as u64) as usize;
                let sign = if (hash >> (j + 60)) & 1 == 0 { 1.0 } else { -1.0 };
                vector[idx] += sign;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Embedding::new(vector)
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(EMBEDDING_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    fn id(&self) -> &str {
        "hash"
    }

    async fn embed(
        &self,
        _task: TaskType,
        _title: &str,
        content: &str,
    ) -> Result<Embedding, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hash_text(content))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
#[path = "embedding_tests.rs"]
mod tests;
