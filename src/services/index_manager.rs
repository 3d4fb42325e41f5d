//! Consistency manager between the document store and the vector index.
//!
//! Every document moves `Absent -> StoredOnly -> Indexed`. The store write
//! always happens first; if the vector cannot be produced or appended the
//! document is deleted again (`compensate_insert`) so the store never keeps a
//! document the index cannot find. Index, mapping and save generation live
//! behind one `RwLock`, and every mutation is written through to disk.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    DocumentKey, DocumentState, IndexStats, KeyFilter, Metadata, NewDocument, RebuildConfig,
    RebuildReport, SearchHit,
};
use crate::domain::ports::{DocumentStore, EmbeddingInput, EmbeddingProvider};
use crate::infrastructure::vector::{FlatIndex, IdMapping, PersistenceError, SnapshotOrigin, SnapshotStore};
use crate::services::embedding_service::EmbeddingService;

/// Knobs for a single rebuild run.
#[derive(Debug, Clone)]
pub struct RebuildOptions {
    /// Documents per provider batch call.
    pub batch_size: usize,
    /// Abort when the rebuild runs longer than this.
    pub timeout: Option<Duration>,
    /// Log progress every N indexed documents.
    pub progress_interval: usize,
    pub cancel: CancellationToken,
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self::from_config(&RebuildConfig::default())
    }
}

impl RebuildOptions {
    pub fn from_config(config: &RebuildConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            timeout: config.timeout_secs.map(Duration::from_secs),
            progress_interval: config.progress_interval.max(1),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

struct IndexState {
    index: FlatIndex,
    mapping: IdMapping,
    generation: u64,
}

pub struct IndexManager {
    store: Arc<dyn DocumentStore>,
    embeddings: EmbeddingService,
    snapshots: SnapshotStore,
    dimension: usize,
    state: RwLock<IndexState>,
}

impl IndexManager {
    /// Load the snapshot (or start blank) and wire up the collaborators.
    ///
    /// Fails only when the provider's dimension disagrees with `dimension`.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn EmbeddingProvider>,
        snapshots: SnapshotStore,
        dimension: usize,
    ) -> DomainResult<Self> {
        if provider.dimension() != dimension {
            return Err(DomainError::DimensionMismatch {
                expected: dimension,
                actual: provider.dimension(),
            });
        }

        let loaded = snapshots.load(dimension).await;
        if let SnapshotOrigin::Recovered { reason } = &loaded.origin {
            tracing::warn!(%reason, "snapshot discarded, index starts empty until repaired");
        }
        tracing::info!(
            vectors = loaded.index.len(),
            dimension,
            provider = provider.name(),
            "index manager ready"
        );

        Ok(Self {
            store,
            embeddings: EmbeddingService::new(provider),
            snapshots,
            dimension,
            state: RwLock::new(IndexState {
                index: loaded.index,
                mapping: loaded.mapping,
                generation: loaded.generation,
            }),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Store a document, embed it and make it searchable.
    ///
    /// A failed snapshot write does not fail the call: the document is
    /// indexed in memory and a durability warning is logged.
    pub async fn add_document(&self, text: &str, metadata: Metadata) -> DomainResult<DocumentKey> {
        if text.trim().is_empty() {
            return Err(DomainError::EmptyContent);
        }

        let key = self.store.insert(NewDocument::new(text, metadata)).await?;
        log_transition(&key, DocumentState::Absent, DocumentState::StoredOnly);

        let vector = match self.embeddings.embed_single(text).await {
            Ok(vector) => vector,
            Err(e) => {
                self.compensate_insert(&key).await;
                return Err(as_embedding_failure(e));
            }
        };

        let mut state = self.state.write().await;
        // A rebuild that ran while we were embedding already indexed this key.
        if state.mapping.contains_key(&key) {
            tracing::debug!(key = %key, "document already indexed by a concurrent rebuild");
            return Ok(key);
        }
        let appended = state.index.append(&vector);
        let position = match appended {
            Ok(position) => position,
            Err(e) => {
                drop(state);
                self.compensate_insert(&key).await;
                return Err(as_embedding_failure(e));
            }
        };
        state.mapping.put(position, key.clone());
        log_transition(&key, DocumentState::StoredOnly, DocumentState::Indexed);

        if let Err(e) = self.persist(&mut state).await {
            tracing::warn!(
                key = %key,
                position,
                error = %e,
                "document indexed in memory but snapshot write failed; it will be lost on restart until the next save"
            );
        }

        tracing::info!(key = %key, position, "document ingested");
        Ok(key)
    }

    /// Undo a store insert whose document could not be indexed.
    async fn compensate_insert(&self, key: &DocumentKey) {
        match self.store.delete(key).await {
            Ok(()) => log_transition(key, DocumentState::StoredOnly, DocumentState::Absent),
            Err(e) => tracing::error!(
                key = %key,
                error = %e,
                "compensating delete failed, document left in store without index entry"
            ),
        }
    }

    /// Nearest documents to `query`, ascending by distance.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&KeyFilter>,
    ) -> DomainResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(DomainError::Validation("search query cannot be empty".to_string()));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        {
            let state = self.state.read().await;
            if state.index.is_empty() {
                tracing::debug!("search on empty index");
                return Ok(Vec::new());
            }
            if let Some(filter) = filter {
                if !filter.iter().any(|key| state.mapping.contains_key(key)) {
                    tracing::debug!(filter_keys = filter.len(), "no filter key is indexed");
                    return Ok(Vec::new());
                }
            }
        }

        let query_vector = self.embeddings.embed_single(query).await?;

        let candidates: Vec<(DocumentKey, f32)> = {
            let state = self.state.read().await;
            let neighbors = state.index.search(&query_vector, k.min(state.index.len()))?;
            neighbors
                .into_iter()
                .filter_map(|neighbor| match state.mapping.get(neighbor.position) {
                    Some(key) => Some((key.clone(), neighbor.distance)),
                    None => {
                        tracing::warn!(position = neighbor.position, "index position has no mapping entry");
                        None
                    }
                })
                .filter(|(key, _)| filter.is_none_or(|f| f.contains(key)))
                .collect()
        };

        let mut hits = Vec::with_capacity(candidates.len());
        for (key, distance) in candidates {
            let document = match self.store.find_by_key(&key).await {
                Ok(Some(document)) => document,
                Ok(None) => {
                    tracing::warn!(key = %key, "indexed document missing from store");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "failed to load indexed document, skipping");
                    continue;
                }
            };
            let Some(body) = document.body() else {
                tracing::debug!(key = %key, "indexed document has no body");
                continue;
            };
            hits.push(SearchHit {
                text: body.to_string(),
                key,
                metadata: document.metadata,
                score: distance,
            });
        }

        tracing::debug!(k, results = hits.len(), "search complete");
        Ok(hits)
    }

    /// Re-embed every stored document into a fresh index and swap it in.
    ///
    /// Searches wait for the duration. On cancellation or timeout the
    /// previous index stays installed.
    pub async fn rebuild_index(&self, options: &RebuildOptions) -> DomainResult<RebuildReport> {
        let started = Instant::now();
        let deadline = options.timeout.map(|timeout| started + timeout);
        let batch_size = options.batch_size.max(1);
        let progress_interval = options.progress_interval.max(1);

        let mut state = self.state.write().await;
        let expected = self.store.count().await?;
        tracing::info!(documents = expected, batch_size, "rebuilding index");

        let mut index = FlatIndex::new(self.dimension);
        let mut mapping = IdMapping::new();
        let mut report = RebuildReport::default();
        let mut api_calls = 0;
        let mut fallbacks = 0;
        let mut batches = self.store.iterate().chunks(batch_size);

        while let Some(batch) = batches.next().await {
            check_interrupted(options, deadline, report.processed)?;

            let mut keys = Vec::with_capacity(batch.len());
            let mut inputs = Vec::with_capacity(batch.len());
            for document in batch {
                report.total += 1;
                let document = match document {
                    Ok(document) => document,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(error = %e, "skipping unreadable document during rebuild");
                        continue;
                    }
                };
                match document.indexable_body() {
                    Some(body) => {
                        inputs.push(EmbeddingInput {
                            id: document.key.to_string(),
                            text: body.to_string(),
                        });
                        keys.push(document.key);
                    }
                    None => {
                        report.failed += 1;
                        tracing::warn!(key = %document.key, "skipping document without body");
                    }
                }
            }

            let (items, embedded) = tokio::select! {
                biased;
                () = options.cancel.cancelled() => {
                    return Err(DomainError::RebuildCancelled { processed: report.processed });
                }
                () = wait_until(deadline) => {
                    return Err(DomainError::RebuildTimedOut { processed: report.processed });
                }
                embedded = self.embeddings.embed_many_with_report(&inputs) => embedded,
            };

            api_calls += embedded.api_calls;
            fallbacks += embedded.fallbacks;

            for (key, item) in keys.into_iter().zip(items) {
                match item.vector.and_then(|vector| index.append(&vector)) {
                    Ok(position) => {
                        mapping.put(position, key);
                        report.processed += 1;
                        if report.processed % progress_interval == 0 {
                            tracing::info!(processed = report.processed, total = expected, "rebuild progress");
                        }
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(key = %key, error = %e, "failed to index document during rebuild");
                    }
                }
            }
        }
        drop(batches);

        state.index = index;
        state.mapping = mapping;
        report.persisted = match self.persist(&mut state).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "rebuilt index could not be saved");
                false
            }
        };

        tracing::info!(
            total = report.total,
            processed = report.processed,
            failed = report.failed,
            api_calls,
            fallbacks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index rebuild complete"
        );
        Ok(report)
    }

    /// Rebuild when the index is empty while the store is not.
    pub async fn repair_if_needed(&self, options: &RebuildOptions) -> DomainResult<Option<RebuildReport>> {
        if !self.state.read().await.index.is_empty() {
            return Ok(None);
        }
        let documents = self.store.count().await?;
        if documents == 0 {
            return Ok(None);
        }

        tracing::warn!(documents, "index is empty but the store is not, rebuilding");
        self.rebuild_index(options).await.map(Some)
    }

    pub async fn stats(&self) -> DomainResult<IndexStats> {
        let (vector_count, mapping_entries) = {
            let state = self.state.read().await;
            (state.index.len(), state.mapping.len())
        };
        let document_count = self.store.count().await?;

        let stats = IndexStats {
            vector_count,
            mapping_entries,
            document_count,
            dimension: self.dimension,
        };
        if !stats.is_consistent() {
            tracing::warn!(vector_count, mapping_entries, document_count, "index and store have drifted");
        }
        Ok(stats)
    }

    /// Write the current state to disk one last time.
    pub async fn shutdown(&self) -> DomainResult<()> {
        let mut state = self.state.write().await;
        self.persist(&mut state)
            .await
            .map_err(|e| DomainError::Persistence(e.to_string()))?;
        tracing::info!(vectors = state.index.len(), "index saved on shutdown");
        Ok(())
    }

    async fn persist(&self, state: &mut IndexState) -> Result<(), PersistenceError> {
        let generation = state.generation + 1;
        self.snapshots.save(&state.index, &state.mapping, generation).await?;
        state.generation = generation;
        Ok(())
    }
}

fn log_transition(key: &DocumentKey, from: DocumentState, to: DocumentState) {
    debug_assert!(from.can_transition_to(to), "illegal transition {from} -> {to}");
    tracing::debug!(key = %key, from = from.as_str(), to = to.as_str(), "document state changed");
}

fn as_embedding_failure(error: DomainError) -> DomainError {
    match error {
        DomainError::EmbeddingFailed(_) => error,
        other => DomainError::EmbeddingFailed(other.to_string()),
    }
}

fn check_interrupted(options: &RebuildOptions, deadline: Option<Instant>, processed: usize) -> DomainResult<()> {
    if options.cancel.is_cancelled() {
        tracing::warn!(processed, "rebuild cancelled, keeping previous index");
        return Err(DomainError::RebuildCancelled { processed });
    }
    if deadline.is_some_and(|d| Instant::now() >= d) {
        tracing::warn!(processed, "rebuild timed out, keeping previous index");
        return Err(DomainError::RebuildTimedOut { processed });
    }
    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
