//! Flat (exhaustive) vector index.
//!
//! Vectors are stored contiguously in append order; position `p` occupies
//! `data[p * dimension..(p + 1) * dimension]`. Search is a full scan using
//! squared Euclidean distance, so results are exact.

use std::cmp::Ordering;

use crate::domain::errors::{DomainError, DomainResult};

/// A search hit inside the index: a position and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// In-memory flat L2 index over fixed-dimension vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    count: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            count: 0,
            data: Vec::new(),
        }
    }

    /// Rebuild an index from a contiguous buffer, as read back from disk.
    pub fn from_raw(dimension: usize, data: Vec<f32>) -> DomainResult<Self> {
        if dimension == 0 {
            return Err(DomainError::Validation("index dimension must be greater than 0".to_string()));
        }
        if data.len() % dimension != 0 {
            return Err(DomainError::DimensionMismatch {
                expected: dimension,
                actual: data.len() % dimension,
            });
        }
        Ok(Self {
            dimension,
            count: data.len() / dimension,
            data,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Total number of vectors held.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The raw contiguous vector buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Vector stored at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.count {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Append a vector and return the position it was assigned.
    ///
    /// Positions are handed out in strict append order with no gaps.
    pub fn append(&mut self, vector: &[f32]) -> DomainResult<usize> {
        self.check_dimension(vector)?;
        let position = self.count;
        self.data.extend_from_slice(vector);
        self.count += 1;
        Ok(position)
    }

    /// Return up to `k` nearest positions, ascending by distance.
    ///
    /// Equal distances are ordered by position.
    pub fn search(&self, query: &[f32], k: usize) -> DomainResult<Vec<Neighbor>> {
        self.check_dimension(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: squared_l2(query, vector),
            })
            .collect();

        let k = k.min(neighbors.len());
        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, compare_neighbors);
            neighbors.truncate(k);
        }
        neighbors.sort_by(compare_neighbors);
        Ok(neighbors)
    }

    fn check_dimension(&self, vector: &[f32]) -> DomainResult<()> {
        if vector.len() != self.dimension {
            return Err(DomainError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.position.cmp(&b.position))
}

/// Squared Euclidean distance. Lower is more similar.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
