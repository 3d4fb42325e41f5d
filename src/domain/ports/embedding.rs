//! Embedding provider port.
//!
//! Converts text into fixed-length vectors. Providers are the dominant
//! latency source of the engine and the only network call made on the
//! search path.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// A single embedding request item.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Client-side correlation ID.
    pub id: String,
    /// Text to embed.
    pub text: String,
}

/// A single embedding result.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// Correlation ID matching the input.
    pub id: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
}

/// Trait for embedding providers.
///
/// Failures (network, quota, model errors) are reported as
/// [`DomainError::EmbeddingFailed`](crate::domain::errors::DomainError::EmbeddingFailed).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "openai", "hashing").
    fn name(&self) -> &'static str;

    /// Dimension of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>>;

    /// Generate embeddings for several texts, preserving input order.
    ///
    /// The default issues one `embed` call per input.
    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        let mut outputs = Vec::with_capacity(inputs.len());
        for input in inputs {
            outputs.push(EmbeddingOutput {
                id: input.id.clone(),
                vector: self.embed(&input.text).await?,
            });
        }
        Ok(outputs)
    }

    /// Maximum number of texts per single API call.
    fn max_batch_size(&self) -> usize {
        1
    }
}
