//! Dense embedding provider boundary.
//!
//! The engine treats embedding as an opaque collaborator that may be
//! absent or broken at any point; the semantic model degrades rather
//! than surfacing provider failures. [`HashEmbedder`] is the built-in
//! fallback encoder so fused search works with no model weights on
//! disk.

use std::hash::Hasher;

use thiserror::Error;
use twox_hash::XxHash64;

/// Dimensionality of the built-in hashing encoder.
pub const DEFAULT_EMBEDDING_DIM: usize = 256;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
    #[error("embedding failed: {0}")]
    Failed(String),
}

/// Text-to-vector encoder.
///
/// Implementations must return vectors of exactly `dim()` floats.
#[async_trait::async_trait(?Send)]
pub trait Embedder {
    fn dim(&self) -> usize;

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    async fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.encode(text).await?);
        }
        Ok(vectors)
    }
}

/// Deterministic feature-hash encoder.
///
/// Projects token occurrences onto signed buckets and L2-normalizes
/// the result. Not a learned embedding: it captures token overlap, not
/// meaning, but it is dependency-free and stable across runs.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

#[async_trait::async_trait(?Send)]
impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let hash = hasher.finish();
            let bucket = (hash % self.dim as u64) as usize;
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encoding_is_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.encode("supervised learning").await.unwrap();
        let b = embedder.encode("supervised learning").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_EMBEDDING_DIM);
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let embedder = HashEmbedder::new(64);
        let v = embedder.encode("databases normalize tables").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn different_texts_differ() {
        let embedder = HashEmbedder::default();
        let a = embedder.encode("supervised learning").await.unwrap();
        let b = embedder.encode("relational databases").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn empty_text_is_a_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.encode("").await.unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn batch_matches_single_encodes() {
        let embedder = HashEmbedder::new(32);
        let batch = embedder
            .encode_batch(&["alpha beta", "gamma"])
            .await
            .unwrap();
        let single = embedder.encode("alpha beta").await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], single);
    }
}
