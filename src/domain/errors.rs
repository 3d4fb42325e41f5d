//! Domain errors for the semdex retrieval engine.

use thiserror::Error;

/// Domain-level errors that can occur in the retrieval engine.
///
/// Variants group into the engine's failure classes:
/// - validation (`EmptyContent`, `Validation`): rejected before any external call
/// - provider (`EmbeddingFailed`): compensated on ingest, degraded on search
/// - store (`Store`, `DocumentNotFound`): fatal for ingest, skipped during result assembly
/// - persistence (`Persistence`): logged, never fatal
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Document content cannot be empty")]
    EmptyContent,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Index rebuild was cancelled after {processed} documents")]
    RebuildCancelled { processed: usize },

    #[error("Index rebuild timed out after {processed} documents")]
    RebuildTimedOut { processed: usize },

    #[error("Response generation failed: {0}")]
    GenerationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether the error was raised before any external collaborator was called.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyContent | Self::Validation(_))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(DomainError::EmptyContent.is_validation());
        assert!(DomainError::Validation("bad key".to_string()).is_validation());
        assert!(!DomainError::EmbeddingFailed("quota".to_string()).is_validation());
        assert!(!DomainError::Store("locked".to_string()).is_validation());
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = DomainError::DimensionMismatch { expected: 8, actual: 4 };
        assert_eq!(err.to_string(), "Vector dimension mismatch: expected 8, got 4");
    }
}
