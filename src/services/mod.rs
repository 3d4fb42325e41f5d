//! Application services.

pub mod embedding_service;
pub mod index_manager;
pub mod rag_service;
pub mod retrieval_service;

pub use embedding_service::{BatchEmbeddingReport, EmbeddedItem, EmbeddingService};
pub use index_manager::{IndexManager, RebuildOptions};
pub use rag_service::{build_context, Answer, RagService};
pub use retrieval_service::RetrievalService;
