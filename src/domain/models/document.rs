//! Document domain model.
//!
//! Documents are owned by the document store. The retrieval engine only
//! creates them on ingest, reads them by key, and deletes them as a
//! compensating action when an ingest cannot be completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};

/// Opaque metadata attached to a document.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// String form of the document store's native key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Parse a key supplied by a caller.
    ///
    /// Surrounding whitespace is trimmed. Blank keys and keys containing
    /// whitespace or control characters are rejected.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation("document key cannot be empty".to_string()));
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(DomainError::Validation(format!("malformed document key: {trimmed:?}")));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields for a document about to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewDocument {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self { text: text.into(), metadata }
    }
}

/// A document as held by the document store.
///
/// Older records may carry their body under `content` instead of `text`;
/// [`StoredDocument::body`] tolerates either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub key: DocumentKey,
    pub text: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl StoredDocument {
    /// The document body: `text` when non-empty, otherwise `content`.
    pub fn body(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.content.as_deref().filter(|c| !c.is_empty()))
    }

    /// The body, if it contains anything other than whitespace.
    pub fn indexable_body(&self) -> Option<&str> {
        self.body().filter(|b| !b.trim().is_empty())
    }
}

/// Lifecycle of a single document relative to the index.
///
/// `Absent -> StoredOnly -> Indexed` on a successful ingest;
/// `StoredOnly -> Absent` through the compensating delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Neither stored nor indexed.
    Absent,
    /// Durable in the store but not yet searchable.
    StoredOnly,
    /// Stored and reachable through the index mapping.
    Indexed,
}

impl DocumentState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::StoredOnly => "stored_only",
            Self::Indexed => "indexed",
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Absent, Self::StoredOnly)
                | (Self::StoredOnly, Self::Indexed)
                | (Self::StoredOnly, Self::Absent)
        )
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: Option<&str>, content: Option<&str>) -> StoredDocument {
        StoredDocument {
            key: DocumentKey::parse("k1").unwrap(),
            text: text.map(str::to_string),
            content: content.map(str::to_string),
            metadata: Metadata::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_key_parse_trims() {
        let key = DocumentKey::parse("  abc-123 ").unwrap();
        assert_eq!(key.as_str(), "abc-123");
    }

    #[test]
    fn test_key_parse_rejects_blank_and_malformed() {
        assert!(matches!(DocumentKey::parse("   "), Err(DomainError::Validation(_))));
        assert!(matches!(DocumentKey::parse("a b"), Err(DomainError::Validation(_))));
        assert!(matches!(DocumentKey::parse("a\u{0}b"), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_body_prefers_text() {
        assert_eq!(doc(Some("t"), Some("c")).body(), Some("t"));
    }

    #[test]
    fn test_body_falls_back_to_content() {
        assert_eq!(doc(None, Some("c")).body(), Some("c"));
        assert_eq!(doc(Some(""), Some("c")).body(), Some("c"));
        assert_eq!(doc(None, None).body(), None);
    }

    #[test]
    fn test_indexable_body_rejects_whitespace() {
        assert_eq!(doc(Some("   "), None).indexable_body(), None);
        assert_eq!(doc(Some(" x "), None).indexable_body(), Some(" x "));
    }

    #[test]
    fn test_state_transitions() {
        assert!(DocumentState::Absent.can_transition_to(DocumentState::StoredOnly));
        assert!(DocumentState::StoredOnly.can_transition_to(DocumentState::Indexed));
        assert!(DocumentState::StoredOnly.can_transition_to(DocumentState::Absent));
        assert!(!DocumentState::Absent.can_transition_to(DocumentState::Indexed));
        assert!(!DocumentState::Indexed.can_transition_to(DocumentState::Absent));
    }
}
