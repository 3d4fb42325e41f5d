//! Embedding service for batch and real-time vector generation.
//!
//! Wraps an [`EmbeddingProvider`] and checks every vector against the
//! provider's declared dimension. Bulk embedding (used by rebuild) goes
//! through the batch API in chunks and falls back to per-item calls when a
//! batch call fails, so a single bad input never sinks its whole chunk.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::embedding::{EmbeddingInput, EmbeddingProvider};

/// Report from a batch embedding operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchEmbeddingReport {
    /// Total items submitted.
    pub total_items: usize,
    /// Items successfully embedded.
    pub succeeded: usize,
    /// Items that failed.
    pub failed: usize,
    /// Number of provider calls made.
    pub api_calls: usize,
    /// Batch calls that failed and were retried item by item.
    pub fallbacks: usize,
}

/// Outcome for one input of a bulk embedding call.
#[derive(Debug)]
pub struct EmbeddedItem {
    pub id: String,
    pub vector: DomainResult<Vec<f32>>,
}

/// Embedding service that orchestrates embedding generation.
#[derive(Clone)]
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingService {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Provider name for diagnostics.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    /// Embed a single text.
    pub async fn embed_single(&self, text: &str) -> DomainResult<Vec<f32>> {
        let vector = self.provider.embed(text).await?;
        self.check_dimension(vector)
    }

    /// Embed many texts, one outcome per input in input order.
    pub async fn embed_many_with_report(
        &self,
        inputs: &[EmbeddingInput],
    ) -> (Vec<EmbeddedItem>, BatchEmbeddingReport) {
        let mut report = BatchEmbeddingReport {
            total_items: inputs.len(),
            ..Default::default()
        };
        let mut items = Vec::with_capacity(inputs.len());
        let chunk_size = self.provider.max_batch_size().max(1);

        for chunk in inputs.chunks(chunk_size) {
            report.api_calls += 1;
            match self.provider.embed_batch(chunk).await {
                Ok(outputs) if outputs.len() == chunk.len() => {
                    for (input, output) in chunk.iter().zip(outputs) {
                        items.push(EmbeddedItem {
                            id: input.id.clone(),
                            vector: self.check_dimension(output.vector),
                        });
                    }
                }
                Ok(outputs) => {
                    tracing::warn!(
                        expected = chunk.len(),
                        received = outputs.len(),
                        provider = self.provider_name(),
                        "batch embedding returned wrong number of vectors, falling back to single calls"
                    );
                    report.fallbacks += 1;
                    self.embed_each(chunk, &mut items, &mut report).await;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        batch = chunk.len(),
                        provider = self.provider_name(),
                        "batch embedding failed, falling back to single calls"
                    );
                    report.fallbacks += 1;
                    self.embed_each(chunk, &mut items, &mut report).await;
                }
            }
        }

        report.succeeded = items.iter().filter(|item| item.vector.is_ok()).count();
        report.failed = report.total_items - report.succeeded;
        (items, report)
    }

    async fn embed_each(
        &self,
        chunk: &[EmbeddingInput],
        items: &mut Vec<EmbeddedItem>,
        report: &mut BatchEmbeddingReport,
    ) {
        for input in chunk {
            report.api_calls += 1;
            items.push(EmbeddedItem {
                id: input.id.clone(),
                vector: self.embed_single(&input.text).await,
            });
        }
    }

    fn check_dimension(&self, vector: Vec<f32>) -> DomainResult<Vec<f32>> {
        let expected = self.provider.dimension();
        if vector.len() == expected {
            Ok(vector)
        } else {
            Err(DomainError::DimensionMismatch {
                expected,
                actual: vector.len(),
            })
        }
    }
}
