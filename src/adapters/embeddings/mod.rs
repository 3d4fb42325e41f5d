//! Embedding provider adapters.

pub mod hashing;
pub mod openai;

pub use hashing::HashingEmbeddingProvider;
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EmbeddingConfig, EmbeddingProviderKind};
use crate::domain::ports::EmbeddingProvider;

/// Construct the configured provider, producing vectors of `dimension`.
pub fn build_embedding_provider(
    config: &EmbeddingConfig,
    dimension: usize,
) -> DomainResult<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderKind::Openai => Arc::new(OpenAiEmbeddingProvider::new(
            OpenAiEmbeddingConfig::from_settings(config, dimension),
        )?),
        EmbeddingProviderKind::Hashing => Arc::new(HashingEmbeddingProvider::new(dimension)?),
    };
    tracing::debug!(provider = provider.name(), dimension, "embedding provider ready");
    Ok(provider)
}
