//! Vector store abstraction for Samtale.
//!
//! Provides a trait-based interface over vector database backends. The real
//! backend is a Chroma server reached over HTTP; the in-memory store backs
//! tests and small corpora.

mod chroma;
mod memory;

pub use chroma::ChromaVectorStore;
pub use memory::MemoryVectorStore;

use crate::error::Result;
use crate::transcript::TranscriptMetadata;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Queryable metadata stored alongside every record.
///
/// `file_path` is always present; it is what makes whole-file deletion and
/// idempotent re-indexing possible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub file_path: String,
    pub file_name: String,
    pub client_name: Option<String>,
    pub call_date: Option<NaiveDate>,
    /// Participants joined with ", " (the store only takes scalars).
    pub participants: Option<String>,
    pub call_type: Option<String>,
    pub start_time: f64,
    pub end_time: f64,
    pub speaker: Option<String>,
}

impl RecordMetadata {
    /// Build record metadata from transcript metadata plus a time range.
    pub fn from_transcript(
        metadata: &TranscriptMetadata,
        start_time: f64,
        end_time: f64,
        speaker: Option<String>,
    ) -> Self {
        Self {
            file_path: metadata.file_path.clone(),
            file_name: metadata.file_name.clone(),
            client_name: metadata.client_name.clone(),
            call_date: metadata.call_date,
            participants: metadata.participants.as_ref().map(|p| p.join(", ")),
            call_type: metadata.call_type.clone(),
            start_time,
            end_time,
            speaker,
        }
    }
}

/// A record ready for storage: id, text, embedding, metadata.
#[derive(Debug, Clone)]
pub struct TranscriptRecord {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// A search hit with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub id: String,
    pub text: String,
    /// Similarity in [0, 1], 1 = most similar.
    pub score: f32,
    pub metadata: RecordMetadata,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotently ensure the backing collection exists.
    async fn initialize(&self) -> Result<()>;

    /// Insert records. No-op on empty input. Returns the number stored.
    async fn add(&self, records: &[TranscriptRecord]) -> Result<usize>;

    /// Pure similarity search: `limit` nearest neighbors, scores below
    /// `min_score` discarded, remainder sorted by descending score.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredRecord>>;

    /// Whether any record exists for `file_path`.
    ///
    /// A query failure counts as "not indexed" — this gates a skip
    /// optimization, not correctness.
    async fn exists_for_path(&self, file_path: &str) -> bool;

    /// Delete every record belonging to `file_path`. Returns the number
    /// deleted; no-op if none matched.
    async fn delete_by_path(&self, file_path: &str) -> Result<usize>;

    /// Total record count.
    async fn count(&self) -> Result<usize>;
}

/// Convert a cosine distance in [0, 2] to a similarity score in [0, 1].
///
/// A missing distance should be passed as the maximum (2.0), mapping to 0.
pub fn distance_to_score(distance: f32) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0)
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
