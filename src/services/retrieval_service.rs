//! Public retrieval surface: ingest, search, rebuild, stats.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Config, DocumentKey, IndexStats, KeyFilter, Metadata, RebuildConfig, RebuildReport, SearchConfig,
    SearchResponse,
};
use crate::domain::ports::{DocumentStore, EmbeddingProvider};
use crate::infrastructure::vector::SnapshotStore;
use crate::services::index_manager::{IndexManager, RebuildOptions};

/// Facade over the [`IndexManager`].
///
/// Search faults never reach the caller; they come back as an empty
/// [`SearchResponse`] with a diagnostic.
#[derive(Clone)]
pub struct RetrievalService {
    manager: Arc<IndexManager>,
    search: SearchConfig,
    rebuild: RebuildConfig,
}

impl RetrievalService {
    pub fn new(manager: Arc<IndexManager>, search: SearchConfig, rebuild: RebuildConfig) -> Self {
        Self { manager, search, rebuild }
    }

    /// Open the index from its snapshot and repair it once if it came up empty.
    ///
    /// A failed repair is logged; the service still starts.
    pub async fn bootstrap(
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn EmbeddingProvider>,
        config: &Config,
    ) -> DomainResult<Self> {
        let manager = IndexManager::open(
            store,
            provider,
            SnapshotStore::from_config(&config.index),
            config.index.dimension,
        )
        .await?;
        let service = Self::new(Arc::new(manager), config.search.clone(), config.rebuild.clone());

        match service.manager.repair_if_needed(&service.rebuild_options()).await {
            Ok(Some(report)) => tracing::info!(
                processed = report.processed,
                failed = report.failed,
                "index repaired on startup"
            ),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "startup repair failed, serving the current index"),
        }

        Ok(service)
    }

    pub fn manager(&self) -> &Arc<IndexManager> {
        &self.manager
    }

    pub fn default_k(&self) -> usize {
        self.search.default_k
    }

    /// Rebuild options derived from configuration, with a fresh cancel token.
    pub fn rebuild_options(&self) -> RebuildOptions {
        RebuildOptions::from_config(&self.rebuild)
    }

    pub async fn ingest(&self, text: &str, metadata: Metadata) -> DomainResult<DocumentKey> {
        self.manager.add_document(text, metadata).await
    }

    /// `k` falls back to the configured default.
    pub async fn search(&self, query: &str, k: Option<usize>, filter: Option<&KeyFilter>) -> SearchResponse {
        let k = k.unwrap_or(self.search.default_k);
        match self.manager.search(query, k, filter).await {
            Ok(results) => SearchResponse::ok(results),
            Err(e) if e.is_validation() => {
                tracing::debug!(error = %e, "search rejected");
                SearchResponse::degraded(e.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "search degraded to empty result");
                SearchResponse::degraded(e.to_string())
            }
        }
    }

    pub async fn rebuild(&self, options: &RebuildOptions) -> DomainResult<RebuildReport> {
        self.manager.rebuild_index(options).await
    }

    pub async fn stats(&self) -> DomainResult<IndexStats> {
        self.manager.stats().await
    }

    pub async fn shutdown(&self) -> DomainResult<()> {
        self.manager.shutdown().await
    }
}
