//! Retrieval-augmented answering.
//!
//! Retrieves the nearest documents for a question, renders them into a
//! context block and asks a [`ResponseGenerator`] for an answer.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{KeyFilter, SearchHit};
use crate::domain::ports::ResponseGenerator;
use crate::infrastructure::retry::RetryPolicy;
use crate::services::retrieval_service::RetrievalService;

/// An answer with the documents it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SearchHit>,
    /// Why retrieval came back empty, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

pub struct RagService {
    retrieval: RetrievalService,
    generator: Arc<dyn ResponseGenerator>,
    retry: RetryPolicy,
}

impl RagService {
    pub fn new(retrieval: RetrievalService, generator: Arc<dyn ResponseGenerator>, retry: RetryPolicy) -> Self {
        Self {
            retrieval,
            generator,
            retry,
        }
    }

    /// Answer `question` from the `k` nearest documents.
    ///
    /// A degraded retrieval still produces an answer, generated from an
    /// empty context. Generation failures are retried per the policy.
    pub async fn answer(
        &self,
        question: &str,
        k: Option<usize>,
        filter: Option<&KeyFilter>,
    ) -> DomainResult<Answer> {
        if question.trim().is_empty() {
            return Err(DomainError::Validation("question cannot be empty".to_string()));
        }

        let response = self.retrieval.search(question, k, filter).await;
        let context = build_context(&response.results);
        tracing::debug!(
            sources = response.results.len(),
            generator = self.generator.name(),
            "generating answer"
        );

        let answer = self
            .retry
            .execute(|| self.generator.generate(question, &context))
            .await
            .map_err(|e| match e {
                DomainError::GenerationFailed(_) => e,
                other => DomainError::GenerationFailed(other.to_string()),
            })?;

        Ok(Answer {
            answer,
            sources: response.results,
            diagnostic: response.diagnostic,
        })
    }
}

/// Render hits as numbered, blank-line separated context entries.
pub fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("Document {} (relevance: {:.2}):\n{}", i + 1, hit.score, hit.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbeddingProvider;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteDocumentStore};
    use crate::domain::models::{Config, DocumentKey, Metadata};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fails the first `failures` calls, then echoes the context length.
    struct FlakyGenerator {
        failures: usize,
        calls: AtomicUsize,
        last_context: Mutex<String>,
    }

    impl FlakyGenerator {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures,
                calls: AtomicUsize::new(0),
                last_context: Mutex::new(String::new()),
            })
        }
    }

    #[async_trait]
    impl ResponseGenerator for FlakyGenerator {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn generate(&self, _query: &str, context: &str) -> DomainResult<String> {
            *self.last_context.lock().unwrap() = context.to_string();
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(DomainError::GenerationFailed("upstream busy".to_string()));
            }
            Ok(format!("answered with {} bytes of context", context.len()))
        }
    }

    async fn retrieval(dir: &tempfile::TempDir) -> RetrievalService {
        let mut config = Config::default();
        config.index.dir = dir.path().display().to_string();
        config.index.dimension = 32;
        let store = Arc::new(SqliteDocumentStore::new(create_migrated_test_pool().await.unwrap()));
        let provider = Arc::new(HashingEmbeddingProvider::new(32).unwrap());
        RetrievalService::bootstrap(store, provider, &config).await.unwrap()
    }

    fn hit(text: &str, score: f32) -> SearchHit {
        SearchHit {
            key: DocumentKey::parse("k").unwrap(),
            text: text.to_string(),
            metadata: Metadata::new(),
            score,
        }
    }

    #[test]
    fn test_build_context_format() {
        let context = build_context(&[hit("first body", 0.1234), hit("second body", 1.5)]);
        assert_eq!(
            context,
            "Document 1 (relevance: 0.12):\nfirst body\n\nDocument 2 (relevance: 1.50):\nsecond body"
        );
        assert_eq!(build_context(&[]), "");
    }

    #[tokio::test]
    async fn test_answer_retries_then_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let retrieval = retrieval(&dir).await;
        retrieval.ingest("the borrow checker enforces aliasing rules", Metadata::new()).await.unwrap();

        let generator = FlakyGenerator::new(2);
        let rag = RagService::new(retrieval, generator.clone(), RetryPolicy::fixed(3, Duration::ZERO));

        let answer = rag.answer("borrow checker", Some(1), None).await.unwrap();
        assert_eq!(answer.sources.len(), 1);
        assert!(answer.diagnostic.is_none());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        assert!(generator.last_context.lock().unwrap().starts_with("Document 1 (relevance: "));
    }

    #[tokio::test]
    async fn test_answer_fails_after_exhausting_retries() {
        let dir = tempfile::tempdir().unwrap();
        let rag = RagService::new(
            retrieval(&dir).await,
            FlakyGenerator::new(10),
            RetryPolicy::fixed(3, Duration::ZERO),
        );

        let result = rag.answer("anything", None, None).await;
        assert!(matches!(result, Err(DomainError::GenerationFailed(_))));
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let generator = FlakyGenerator::new(0);
        let rag = RagService::new(retrieval(&dir).await, generator.clone(), RetryPolicy::default());

        assert!(rag.answer(" ", None, None).await.unwrap_err().is_validation());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
