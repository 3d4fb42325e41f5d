//! semdex - embedding-backed document retrieval
//!
//! Keeps a flat L2 vector index in exact correspondence with documents held
//! in a durable store, persists it next to the store, and rebuilds it when
//! the two drift apart.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Adapters** (`adapters`): SQLite document store, embedding providers, response generator
//! - **Infrastructure Layer** (`infrastructure`): vector index, snapshots, config, logging, retry
//! - **Service Layer** (`services`): consistency manager, retrieval facade, RAG answering
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use semdex::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let ctx = semdex::cli::AppContext::open(config).await?;
//!     let response = ctx.retrieval.search("quick fox", Some(3), None).await;
//!     println!("{} hit(s)", response.results.len());
//!     ctx.close().await
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, DocumentKey, DocumentState, IndexStats, KeyFilter, Metadata, RebuildReport, SearchHit,
    SearchResponse,
};
pub use domain::ports::{DocumentStore, EmbeddingProvider, ResponseGenerator};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{IndexManager, RagService, RebuildOptions, RetrievalService};
