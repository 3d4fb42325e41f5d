//! Deterministic local embedding provider.
//!
//! Lowercases the text, splits it on non-alphanumeric characters and hashes
//! each token (FNV-1a, 64 bit) into one of `dimension` buckets. The bucket
//! counts are L2-normalized. Texts sharing tokens land close together, which
//! is enough for offline use and reproducible tests. No network involved.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::embedding::EmbeddingProvider;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimension: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(dimension: usize) -> DomainResult<Self> {
        if dimension == 0 {
            return Err(DomainError::Validation("embedding dimension must be positive".to_string()));
        }
        Ok(Self { dimension })
    }

    /// Embed synchronously. Whitespace-only text yields the zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let bucket = (fnv1a(token.as_bytes()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    fn name(&self) -> &'static str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn max_batch_size(&self) -> usize {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::vector::squared_l2;

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashingEmbeddingProvider::new(0).is_err());
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_deterministic_and_normalized() {
        let provider = HashingEmbeddingProvider::new(64).unwrap();
        let a = provider.embed_text("The quick brown fox");
        let b = provider.embed_text("the QUICK, brown fox!");
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_blank_text_is_zero_vector() {
        let provider = HashingEmbeddingProvider::new(8).unwrap();
        assert!(provider.embed_text("  \t ").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_shared_tokens_are_closer() {
        let provider = HashingEmbeddingProvider::new(8).unwrap();
        let query = provider.embed_text("quick fox");
        let related = provider.embed_text("The quick brown fox");
        let unrelated = provider.embed_text("Lorem ipsum dolor sit amet");

        assert!(squared_l2(&query, &related) < squared_l2(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        use crate::domain::ports::embedding::EmbeddingInput;

        let provider = HashingEmbeddingProvider::new(16).unwrap();
        let inputs = vec![
            EmbeddingInput { id: "1".to_string(), text: "alpha beta".to_string() },
            EmbeddingInput { id: "2".to_string(), text: "gamma".to_string() },
        ];
        let outputs = provider.embed_batch(&inputs).await.unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].vector, provider.embed("gamma").await.unwrap());
    }
}
