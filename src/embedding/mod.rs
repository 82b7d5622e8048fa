//! Embedding generation for semantic search and retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for embedding generation.
///
/// Returned vectors are L2-normalized (norm within 0.01 of 1.0).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Tolerance on the L2 norm before a vector is re-normalized.
const NORM_TOLERANCE: f32 = 0.01;

/// Linearly increasing backoff for batch-window retries.
pub(crate) fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * attempt as u64)
}

/// L2-normalize `vector` in place if its norm deviates from 1.0.
///
/// Embedding APIs usually return unit vectors already; this is the manual
/// fallback for models that do not guarantee it.
pub(crate) fn ensure_normalized(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 && (norm - 1.0).abs() > NORM_TOLERANCE {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_normalizes_non_unit_vector() {
        let mut v = vec![3.0, 4.0];
        ensure_normalized(&mut v);
        assert!((norm(&v) - 1.0).abs() < 0.001);
        assert!((v[0] - 0.6).abs() < 0.001);
    }

    #[test]
    fn test_unit_vector_left_untouched() {
        let mut v = vec![1.0, 0.0, 0.0];
        ensure_normalized(&mut v);
        assert_eq!(v, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zero_vector_left_untouched() {
        let mut v = vec![0.0, 0.0];
        ensure_normalized(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn test_retry_delay_increases_linearly() {
        assert_eq!(retry_delay(1), Duration::from_millis(1000));
        assert_eq!(retry_delay(2), Duration::from_millis(2000));
        assert_eq!(retry_delay(3), Duration::from_millis(3000));
    }
}
