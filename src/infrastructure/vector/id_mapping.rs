//! Position-to-key table kept alongside the flat index.

use std::collections::{BTreeMap, HashSet};

use crate::domain::models::DocumentKey;

/// Maps index positions to document store keys.
///
/// Positions are handed out in increasing order, so iteration in position
/// order matches insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMapping {
    entries: BTreeMap<usize, DocumentKey>,
}

impl IdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `position -> key`, replacing any previous entry.
    pub fn put(&mut self, position: usize, key: DocumentKey) {
        self.entries.insert(position, key);
    }

    pub fn get(&self, position: usize) -> Option<&DocumentKey> {
        self.entries.get(&position)
    }

    /// Every key currently mapped.
    pub fn values(&self) -> HashSet<&DocumentKey> {
        self.entries.values().collect()
    }

    pub fn contains_key(&self, key: &DocumentKey) -> bool {
        self.entries.values().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DocumentKey)> {
        self.entries.iter().map(|(p, k)| (*p, k))
    }

    /// Positions below `count` that have no entry.
    pub fn unmapped_positions(&self, count: usize) -> Vec<usize> {
        (0..count).filter(|p| !self.entries.contains_key(p)).collect()
    }
}

impl FromIterator<(usize, DocumentKey)> for IdMapping {
    fn from_iter<I: IntoIterator<Item = (usize, DocumentKey)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DocumentKey {
        DocumentKey::parse(s).unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let mut mapping = IdMapping::new();
        mapping.put(0, key("a"));
        mapping.put(1, key("b"));
        assert_eq!(mapping.get(0), Some(&key("a")));
        assert_eq!(mapping.get(2), None);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_values_is_key_set() {
        let mapping: IdMapping = vec![(0, key("a")), (1, key("b")), (2, key("a"))].into_iter().collect();
        let values = mapping.values();
        assert_eq!(values.len(), 2);
        assert!(values.contains(&key("a")));
        assert!(mapping.contains_key(&key("b")));
        assert!(!mapping.contains_key(&key("z")));
    }

    #[test]
    fn test_iteration_follows_position_order() {
        let mut mapping = IdMapping::new();
        mapping.put(0, key("first"));
        mapping.put(1, key("second"));
        mapping.put(2, key("third"));
        let keys: Vec<&str> = mapping.iter().map(|(_, k)| k.as_str()).collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unmapped_positions() {
        let mapping: IdMapping = vec![(0, key("a")), (2, key("c"))].into_iter().collect();
        assert_eq!(mapping.unmapped_positions(4), vec![1, 3]);
        assert!(mapping.unmapped_positions(1).is_empty());
    }
}
