//! Common test utilities for integration tests
//!
//! Provides shared fixtures used across the integration test files.

#![allow(dead_code)]
use std::sync::Arc;
use tempfile::TempDir;

use semdex::adapters::embeddings::HashingEmbeddingProvider;
use semdex::adapters::sqlite::{create_migrated_test_pool, database_url, initialize_database, SqliteDocumentStore};
use semdex::domain::models::{Config, EmbeddingProviderKind};
use semdex::RetrievalService;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Config pointing the index and database into `dir`, using the hashing provider.
pub fn test_config(dir: &TempDir, dimension: usize) -> Config {
    let mut config = Config::default();
    config.database.path = dir.path().join("semdex.db").display().to_string();
    config.index.dir = dir.path().join("index").display().to_string();
    config.index.dimension = dimension;
    config.embedding.provider = EmbeddingProviderKind::Hashing;
    config
}

/// Retrieval service over an in-memory store.
pub async fn in_memory_service(dir: &TempDir, dimension: usize) -> (RetrievalService, Arc<SqliteDocumentStore>) {
    let store = Arc::new(SqliteDocumentStore::new(
        create_migrated_test_pool().await.expect("Failed to create test pool"),
    ));
    let service = open_service(store.clone(), &test_config(dir, dimension)).await;
    (service, store)
}

/// File-backed store at the config's database path.
pub async fn file_store(config: &Config) -> Arc<SqliteDocumentStore> {
    let pool = initialize_database(&database_url(&config.database.path), None)
        .await
        .expect("Failed to open database");
    Arc::new(SqliteDocumentStore::new(pool))
}

pub async fn open_service(store: Arc<SqliteDocumentStore>, config: &Config) -> RetrievalService {
    let provider = Arc::new(HashingEmbeddingProvider::new(config.index.dimension).expect("valid dimension"));
    RetrievalService::bootstrap(store, provider, config)
        .await
        .expect("Failed to bootstrap retrieval service")
}

/// Setup test logging
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
