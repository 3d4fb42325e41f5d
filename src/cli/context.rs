//! Wires configuration into the store, providers and services used by commands.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::embeddings::build_embedding_provider;
use crate::adapters::generation::OpenAiChatGenerator;
use crate::adapters::sqlite::{database_url, initialize_database, PoolConfig, SqliteDocumentStore};
use crate::domain::models::Config;
use crate::infrastructure::retry::RetryPolicy;
use crate::services::{RagService, RetrievalService};

pub struct AppContext {
    pub config: Config,
    pub retrieval: RetrievalService,
}

impl AppContext {
    /// Open the database, load the index snapshot and repair it if needed.
    pub async fn open(config: Config) -> Result<Self> {
        let url = database_url(&config.database.path);
        let pool = initialize_database(&url, Some(PoolConfig::from(&config.database)))
            .await
            .with_context(|| format!("Failed to open document store at {}", config.database.path))?;
        let store = Arc::new(SqliteDocumentStore::new(pool));

        let provider = build_embedding_provider(&config.embedding, config.index.dimension)
            .context("Failed to configure embedding provider")?;

        let retrieval = RetrievalService::bootstrap(store, provider, &config)
            .await
            .context("Failed to open vector index")?;

        Ok(Self { config, retrieval })
    }

    pub fn rag(&self) -> Result<RagService> {
        let generator = OpenAiChatGenerator::new(&self.config.generation)
            .context("Failed to configure response generator")?;
        Ok(RagService::new(
            self.retrieval.clone(),
            Arc::new(generator),
            RetryPolicy::from_generation_config(&self.config.generation),
        ))
    }

    /// Final snapshot write.
    pub async fn close(self) -> Result<()> {
        self.retrieval.shutdown().await.context("Failed to save index on shutdown")
    }
}
