//! Port traits implemented by adapters.

pub mod document_store;
pub mod embedding;
pub mod response_generator;

pub use document_store::DocumentStore;
pub use embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
pub use response_generator::ResponseGenerator;
