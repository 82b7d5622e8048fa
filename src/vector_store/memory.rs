//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{cosine_similarity, distance_to_score, ScoredRecord, TranscriptRecord, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    records: RwLock<HashMap<String, TranscriptRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn add(&self, records: &[TranscriptRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut store = self.records.write().unwrap();
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredRecord>> {
        let store = self.records.read().unwrap();

        let mut results: Vec<ScoredRecord> = store
            .values()
            .map(|record| {
                // Same distance convention as the Chroma backend
                let distance = 1.0 - cosine_similarity(query_embedding, &record.embedding);
                ScoredRecord {
                    id: record.id.clone(),
                    text: record.text.clone(),
                    score: distance_to_score(distance),
                    metadata: record.metadata.clone(),
                }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn exists_for_path(&self, file_path: &str) -> bool {
        let store = self.records.read().unwrap();
        store.values().any(|r| r.metadata.file_path == file_path)
    }

    async fn delete_by_path(&self, file_path: &str) -> Result<usize> {
        let mut store = self.records.write().unwrap();
        let initial_len = store.len();
        store.retain(|_, r| r.metadata.file_path != file_path);
        Ok(initial_len - store.len())
    }

    async fn count(&self) -> Result<usize> {
        let store = self.records.read().unwrap();
        Ok(store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::super::RecordMetadata;
    use super::*;

    fn record(id: &str, path: &str, embedding: Vec<f32>) -> TranscriptRecord {
        TranscriptRecord {
            id: id.to_string(),
            text: format!("text for {}", id),
            embedding,
            metadata: RecordMetadata {
                file_path: path.to_string(),
                file_name: path.rsplit('/').next().unwrap_or(path).to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_add_search_delete() {
        let store = MemoryVectorStore::new();

        store
            .add(&[
                record("a", "/calls/one.vtt", vec![1.0, 0.0, 0.0]),
                record("b", "/calls/one.vtt", vec![0.0, 1.0, 0.0]),
                record("c", "/calls/two.vtt", vec![0.9, 0.1, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 3);
        assert!(store.exists_for_path("/calls/one.vtt").await);
        assert!(!store.exists_for_path("/calls/missing.vtt").await);

        let results = store.search(&[1.0, 0.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results[0].id, "a");
        assert!(results[0].score > results[1].score);

        let deleted = store.delete_by_path("/calls/one.vtt").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(!store.exists_for_path("/calls/one.vtt").await);
    }

    #[tokio::test]
    async fn test_empty_add_is_noop() {
        let store = MemoryVectorStore::new();
        assert_eq!(store.add(&[]).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_min_score_filter() {
        let store = MemoryVectorStore::new();
        store
            .add(&[
                record("close", "/calls/a.vtt", vec![1.0, 0.0]),
                record("far", "/calls/b.vtt", vec![-1.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "close");
    }
}
