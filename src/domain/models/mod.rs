//! Domain models for the retrieval engine.

pub mod config;
pub mod document;
pub mod search;

pub use config::{
    Config, DatabaseConfig, EmbeddingConfig, EmbeddingProviderKind, GenerationConfig, IndexConfig,
    LoggingConfig, RebuildConfig, SearchConfig,
};
pub use document::{DocumentKey, DocumentState, Metadata, NewDocument, StoredDocument};
pub use search::{IndexStats, KeyFilter, RebuildReport, SearchHit, SearchResponse};
