//! Document store port.
//!
//! The durable key-to-document persistence the index is kept in step with.
//! Only the CRUD surface the engine needs is exposed here.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::errors::DomainResult;
use crate::domain::models::{DocumentKey, NewDocument, StoredDocument};

/// Repository trait for the document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return its durable key.
    async fn insert(&self, document: NewDocument) -> DomainResult<DocumentKey>;

    /// Fetch a document by key. `None` when no such document exists.
    async fn find_by_key(&self, key: &DocumentKey) -> DomainResult<Option<StoredDocument>>;

    /// Delete a document by key.
    ///
    /// # Errors
    /// Returns `DocumentNotFound` if no document carries the key.
    async fn delete(&self, key: &DocumentKey) -> DomainResult<()>;

    /// Number of documents currently stored.
    async fn count(&self) -> DomainResult<u64>;

    /// Lazily stream every stored document in store order.
    ///
    /// The stream is finite and meant to be consumed once per rebuild.
    fn iterate(&self) -> BoxStream<'_, DomainResult<StoredDocument>>;
}
