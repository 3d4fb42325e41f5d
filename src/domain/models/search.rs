//! Search, statistics and rebuild result types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::document::{DocumentKey, Metadata};

/// Restricts a search to a set of document keys.
pub type KeyFilter = HashSet<DocumentKey>;

/// A single search result.
///
/// `score` is the raw squared L2 distance reported by the index: lower is a
/// better match and results are ranked ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub key: DocumentKey,
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

/// Outcome of a facade-level search.
///
/// Search never surfaces a fault to the caller; when the result set is empty
/// because something went wrong, `diagnostic` carries the reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl SearchResponse {
    pub fn ok(results: Vec<SearchHit>) -> Self {
        Self { results, diagnostic: None }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            diagnostic: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// Read-only consistency snapshot of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub vector_count: usize,
    pub mapping_entries: usize,
    pub document_count: u64,
    pub dimension: usize,
}

impl IndexStats {
    /// True when index, mapping and store all agree on the document count.
    pub fn is_consistent(&self) -> bool {
        self.vector_count == self.mapping_entries && self.vector_count as u64 == self.document_count
    }

    /// Index empty while the store still holds documents.
    pub fn needs_repair(&self) -> bool {
        self.vector_count == 0 && self.document_count > 0
    }
}

/// Summary of a full index rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    /// Documents seen in the store.
    pub total: usize,
    /// Documents embedded and indexed.
    pub processed: usize,
    /// Documents skipped because they had no body or could not be embedded.
    pub failed: usize,
    /// Whether the rebuilt snapshot reached disk.
    pub persisted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_consistency() {
        let stats = IndexStats {
            vector_count: 3,
            mapping_entries: 3,
            document_count: 3,
            dimension: 8,
        };
        assert!(stats.is_consistent());
        assert!(!stats.needs_repair());

        let drifted = IndexStats {
            vector_count: 0,
            mapping_entries: 0,
            document_count: 2,
            dimension: 8,
        };
        assert!(!drifted.is_consistent());
        assert!(drifted.needs_repair());
    }

    #[test]
    fn test_degraded_response_serializes_diagnostic() {
        let response = SearchResponse::degraded("embedding provider unavailable");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["diagnostic"], "embedding provider unavailable");
        assert!(json["results"].as_array().unwrap().is_empty());

        let ok = serde_json::to_value(SearchResponse::ok(Vec::new())).unwrap();
        assert!(ok.get("diagnostic").is_none());
    }
}
