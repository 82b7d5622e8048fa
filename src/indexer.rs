//! Indexing orchestration: parse, extract metadata, chunk or summarize,
//! embed, store.
//!
//! Re-indexing is always delete-then-insert on the whole file; records are
//! never updated in place. A per-path in-progress guard keeps overlapping
//! watcher events from indexing the same file twice concurrently.

use crate::chunking::{chunk_segments, Chunk};
use crate::config::{ChunkingSettings, IndexingMode, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::summary::{OpenAISummarizer, Summarizer};
use crate::transcript::{MetadataExtractor, TranscriptMetadata, VttParser};
use crate::vector_store::{ChromaVectorStore, RecordMetadata, TranscriptRecord, VectorStore};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, info, instrument, warn};

/// File extension recognized as a transcript.
pub const TRANSCRIPT_EXTENSION: &str = "vtt";

/// Outcome of a single-file index attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Records were stored.
    Indexed { records: usize },
    /// Nothing was done; see the reason.
    Skipped(SkipReason),
}

/// Why an index attempt was a no-op. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another index of the same file is in flight.
    InProgress,
    /// The file vanished before we got to it.
    FileMissing,
    /// Already indexed and force was not set.
    AlreadyIndexed,
    /// The file parsed to zero segments.
    NoSegments,
}

/// Summary of a directory-wide index run.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryOutcome {
    /// Files that stored records.
    pub indexed: usize,
    /// Files skipped (already indexed, empty, etc.).
    pub skipped: usize,
    /// Files that failed; failures are logged and do not stop the run.
    pub failed: usize,
}

/// The indexing pipeline.
pub struct Indexer {
    parser: VttParser,
    extractor: MetadataExtractor,
    embedder: Arc<dyn Embedder>,
    summarizer: Arc<dyn Summarizer>,
    store: Arc<dyn VectorStore>,
    mode: IndexingMode,
    chunking: ChunkingSettings,
    in_progress: Arc<Mutex<HashSet<String>>>,
}

impl Indexer {
    /// Create an indexer from settings, with OpenAI providers and a Chroma
    /// store for the mode's collection.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
            settings.embedding.batch_size,
            settings.embedding.max_retries,
        ));
        let summarizer = Arc::new(OpenAISummarizer::with_model(&settings.summary.model));
        let store = Arc::new(ChromaVectorStore::new(
            &settings.vector_store.url,
            settings.collection_name(),
        ));

        Ok(Self::with_components(
            embedder,
            summarizer,
            store,
            settings.indexing.mode,
            settings.chunking.clone(),
        ))
    }

    /// Create an indexer with custom components.
    pub fn with_components(
        embedder: Arc<dyn Embedder>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn VectorStore>,
        mode: IndexingMode,
        chunking: ChunkingSettings,
    ) -> Self {
        Self {
            parser: VttParser::new(),
            extractor: MetadataExtractor::new(),
            embedder,
            summarizer,
            store,
            mode,
            chunking,
            in_progress: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Get the vector store (for deletion on file-removal events).
    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    /// Get the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Index a single transcript file.
    ///
    /// Idempotent without `force`: a second call for an already-indexed path
    /// is a no-op. With `force`, all existing records for the path are
    /// deleted before fresh ones are inserted.
    ///
    /// Errors from parsing, embedding, summarizing, or the store propagate
    /// to the caller; skip conditions do not.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn index_file(&self, path: &Path, force: bool) -> Result<IndexOutcome> {
        let key = path.to_string_lossy().into_owned();

        // Per-path lock, held for the whole attempt and released on every
        // exit path by the guard's Drop.
        let Some(_guard) = InProgressGuard::acquire(&self.in_progress, &key) else {
            info!("File is already being indexed, skipping");
            return Ok(IndexOutcome::Skipped(SkipReason::InProgress));
        };

        if !path.exists() {
            info!("File does not exist, skipping");
            return Ok(IndexOutcome::Skipped(SkipReason::FileMissing));
        }

        if !force {
            if self.store.exists_for_path(&key).await {
                info!("File already indexed, skipping");
                return Ok(IndexOutcome::Skipped(SkipReason::AlreadyIndexed));
            }
        } else {
            // Whole-file delete, regardless of record ids: chunk boundaries
            // may have shifted since the last run.
            let deleted = self.store.delete_by_path(&key).await?;
            if deleted > 0 {
                info!("Deleted {} existing records before re-index", deleted);
            }
        }

        let content = tokio::fs::read_to_string(path).await?;
        let mut parsed = self.parser.parse(&content, path);

        if parsed.segments.is_empty() {
            warn!("No segments found in file");
            return Ok(IndexOutcome::Skipped(SkipReason::NoSegments));
        }

        let extracted = self.extractor.extract(path, Some(&content));
        parsed.metadata = parsed.metadata.merged_with(extracted);

        let stored = match self.mode {
            IndexingMode::Segment => self.index_segments(&parsed.metadata, &parsed).await?,
            IndexingMode::Summary => self.index_summary(&parsed.metadata, &parsed).await?,
        };

        info!("Indexed {} records", stored);
        Ok(IndexOutcome::Indexed { records: stored })
    }

    /// Segment mode: chunk, embed each chunk, store as one batch.
    async fn index_segments(
        &self,
        metadata: &TranscriptMetadata,
        parsed: &crate::transcript::ParsedTranscript,
    ) -> Result<usize> {
        let chunks = chunk_segments(
            &parsed.segments,
            self.chunking.max_words,
            self.chunking.overlap_words,
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let records: Vec<TranscriptRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let speaker = chunk_speaker(&chunk);
                TranscriptRecord {
                    id: segment_record_id(&metadata.file_path, chunk.start_time, chunk.end_time),
                    metadata: RecordMetadata::from_transcript(
                        metadata,
                        chunk.start_time,
                        chunk.end_time,
                        speaker,
                    ),
                    text: chunk.text,
                    embedding,
                }
            })
            .collect();

        self.store.add(&records).await
    }

    /// Summary mode: one structured summary, one embedding, one record.
    async fn index_summary(
        &self,
        metadata: &TranscriptMetadata,
        parsed: &crate::transcript::ParsedTranscript,
    ) -> Result<usize> {
        let summary = self.summarizer.summarize(parsed).await?;
        let embedding = self.embedder.embed(&summary).await?;

        let start_time = parsed.segments.first().map(|s| s.start_time).unwrap_or(0.0);
        let end_time = parsed.segments.last().map(|s| s.end_time).unwrap_or(0.0);

        let record = TranscriptRecord {
            id: summary_record_id(&metadata.file_path),
            text: summary,
            embedding,
            metadata: RecordMetadata::from_transcript(metadata, start_time, end_time, None),
        };

        self.store.add(&[record]).await
    }

    /// Index every transcript file in a directory, sequentially.
    ///
    /// A failure on one file is logged and counted, not propagated; a poison
    /// file never blocks the rest of the corpus.
    pub async fn index_directory(&self, dir: &Path, force: bool) -> Result<DirectoryOutcome> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_transcript_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        info!("Found {} transcript files in {}", files.len(), dir.display());

        let mut outcome = DirectoryOutcome::default();
        for path in files {
            match self.index_file(&path, force).await {
                Ok(IndexOutcome::Indexed { .. }) => outcome.indexed += 1,
                Ok(IndexOutcome::Skipped(_)) => outcome.skipped += 1,
                Err(e) => {
                    error!("Failed to index {}: {}", path.display(), e);
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}

/// Whether a path looks like a transcript file (right extension, not a
/// dotfile).
pub fn is_transcript_file(path: &Path) -> bool {
    let extension_ok = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(TRANSCRIPT_EXTENSION));
    let hidden = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true);
    extension_ok && !hidden
}

/// Deterministic id for a segment-mode chunk, stable across re-index runs
/// as long as chunk boundaries do not shift.
pub fn segment_record_id(file_path: &str, start_time: f64, end_time: f64) -> String {
    record_id("segment", &format!("{}:{}:{}", file_path, start_time, end_time))
}

/// Deterministic id for a summary-mode record.
pub fn summary_record_id(file_path: &str) -> String {
    record_id("summary", &format!("summary:{}", file_path))
}

fn record_id(prefix: &str, key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let hex = format!("{:x}", digest);
    format!("{}_{}", prefix, &hex[..16])
}

/// The chunk's speaker when exactly one distinct speaker contributed, else
/// None.
fn chunk_speaker(chunk: &Chunk) -> Option<String> {
    let mut speakers = chunk
        .segments
        .iter()
        .filter_map(|s| s.speaker.as_deref())
        .collect::<HashSet<_>>()
        .into_iter();
    match (speakers.next(), speakers.next()) {
        (Some(only), None) => Some(only.to_string()),
        _ => None,
    }
}

/// Scoped per-path lock over the in-progress set. Removal happens in Drop,
/// so the path is released on success, skip, and failure alike.
struct InProgressGuard {
    set: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InProgressGuard {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, key: &str) -> Option<Self> {
        let mut guard = set.lock().unwrap();
        if !guard.insert(key.to_string()) {
            return None;
        }
        Some(Self {
            set: set.clone(),
            key: key.to_string(),
        })
    }
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingSettings;
    use crate::error::SamtaleError;
    use crate::transcript::ParsedTranscript;
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;
    use std::io::Write;

    /// Deterministic embedder: maps text length onto a fixed unit vector.
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let x = (text.len() % 7) as f32 + 1.0;
            let mut v = vec![x, 1.0, 0.5];
            crate::embedding::ensure_normalized(&mut v);
            Ok(v)
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    struct StubSummarizer;

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, transcript: &ParsedTranscript) -> Result<String> {
            Ok(format!(
                "CALL TYPE: test\n\nSUMMARY:\n{} segments discussed.",
                transcript.segments.len()
            ))
        }
    }

    fn test_indexer(store: Arc<MemoryVectorStore>, mode: IndexingMode) -> Indexer {
        Indexer::with_components(
            Arc::new(StubEmbedder),
            Arc::new(StubSummarizer),
            store,
            mode,
            ChunkingSettings::default(),
        )
    }

    fn write_vtt(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "WEBVTT\n\n\
            00:00:01.000 --> 00:00:05.000\nJane Doe: We should review the budget\n\n\
            00:00:05.000 --> 00:00:09.000\nJohn Smith: Agreed, the numbers look good\n\n\
            00:00:09.000 --> 00:00:12.000\nJane Doe: Let's ship it next week"
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_index_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_vtt(dir.path(), "Acme_2024-01-15_Sales.vtt");
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = test_indexer(store.clone(), IndexingMode::Segment);

        let first = indexer.index_file(&path, false).await.unwrap();
        assert!(matches!(first, IndexOutcome::Indexed { records: 1 }));
        let count = store.count().await.unwrap();

        let second = indexer.index_file(&path, false).await.unwrap();
        assert_eq!(second, IndexOutcome::Skipped(SkipReason::AlreadyIndexed));
        assert_eq!(store.count().await.unwrap(), count);
    }

    #[tokio::test]
    async fn test_force_reindex_replaces_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_vtt(dir.path(), "Acme_2024-01-15_Sales.vtt");
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = test_indexer(store.clone(), IndexingMode::Segment);

        indexer.index_file(&path, false).await.unwrap();
        let before = store.count().await.unwrap();

        let outcome = indexer.index_file(&path, true).await.unwrap();
        assert!(matches!(outcome, IndexOutcome::Indexed { .. }));
        // One fresh set, no stale leftovers
        assert_eq!(store.count().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_missing_file_skipped() {
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = test_indexer(store.clone(), IndexingMode::Segment);

        let outcome = indexer
            .index_file(Path::new("/nonexistent/gone.vtt"), false)
            .await
            .unwrap();
        assert_eq!(outcome, IndexOutcome::Skipped(SkipReason::FileMissing));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_segments_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.vtt");
        std::fs::write(&path, "WEBVTT\n\nNOTE nothing here\n").unwrap();

        let store = Arc::new(MemoryVectorStore::new());
        let indexer = test_indexer(store.clone(), IndexingMode::Segment);

        let outcome = indexer.index_file(&path, false).await.unwrap();
        assert_eq!(outcome, IndexOutcome::Skipped(SkipReason::NoSegments));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_guard() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_vtt(dir.path(), "guarded.vtt");
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = test_indexer(store.clone(), IndexingMode::Segment);

        // Hold the guard, as a concurrent index of the same path would
        let key = path.to_string_lossy().into_owned();
        let guard = InProgressGuard::acquire(&indexer.in_progress, &key).unwrap();

        let outcome = indexer.index_file(&path, false).await.unwrap();
        assert_eq!(outcome, IndexOutcome::Skipped(SkipReason::InProgress));
        assert_eq!(store.count().await.unwrap(), 0);

        // Released guard lets the next attempt proceed
        drop(guard);
        let outcome = indexer.index_file(&path, false).await.unwrap();
        assert!(matches!(outcome, IndexOutcome::Indexed { .. }));
    }

    #[tokio::test]
    async fn test_guard_released_on_failure() {
        struct FailingEmbedder;

        #[async_trait]
        impl Embedder for FailingEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Err(SamtaleError::Embedding("boom".to_string()))
            }
            async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
                Err(SamtaleError::Embedding("boom".to_string()))
            }
            fn dimensions(&self) -> usize {
                3
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = write_vtt(dir.path(), "failing.vtt");
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = Indexer::with_components(
            Arc::new(FailingEmbedder),
            Arc::new(StubSummarizer),
            store,
            IndexingMode::Segment,
            ChunkingSettings::default(),
        );

        assert!(indexer.index_file(&path, false).await.is_err());
        // Guard must have been released despite the failure
        assert!(indexer.in_progress.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_mode_stores_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_vtt(dir.path(), "Acme_2024-01-15_Sales.vtt");
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = test_indexer(store.clone(), IndexingMode::Summary);

        let outcome = indexer.index_file(&path, false).await.unwrap();
        assert!(matches!(outcome, IndexOutcome::Indexed { records: 1 }));

        let results = store.search(&[1.0, 0.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].id.starts_with("summary_"));
        assert!(results[0].text.contains("3 segments"));
        // Summary record spans the whole file
        assert_eq!(results[0].metadata.start_time, 1.0);
        assert_eq!(results[0].metadata.end_time, 12.0);
    }

    #[tokio::test]
    async fn test_end_to_end_single_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_vtt(dir.path(), "Acme_2024-01-15_Sales.vtt");
        let store = Arc::new(MemoryVectorStore::new());
        let indexer = test_indexer(store.clone(), IndexingMode::Segment);

        indexer.index_file(&path, false).await.unwrap();

        // Three short segments fit one chunk spanning the whole file
        let query = StubEmbedder.embed("We should review the budget").await.unwrap();
        let results = store.search(&query, 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].score > 0.0);
        assert_eq!(results[0].metadata.start_time, 1.0);
        assert_eq!(results[0].metadata.end_time, 12.0);
        assert_eq!(results[0].metadata.client_name.as_deref(), Some("Acme"));
        assert!(results[0].id.starts_with("segment_"));
    }

    #[tokio::test]
    async fn test_directory_indexing_tolerates_failures() {
        let dir = tempfile::tempdir().unwrap();
        write_vtt(dir.path(), "good.vtt");
        std::fs::write(dir.path().join("empty.vtt"), "WEBVTT\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a transcript").unwrap();
        std::fs::write(dir.path().join(".hidden.vtt"), "WEBVTT\n").unwrap();

        let store = Arc::new(MemoryVectorStore::new());
        let indexer = test_indexer(store.clone(), IndexingMode::Segment);

        let outcome = indexer.index_directory(dir.path(), false).await.unwrap();
        assert_eq!(outcome.indexed, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.failed, 0);
    }

    #[test]
    fn test_record_ids_deterministic() {
        let a = segment_record_id("/calls/a.vtt", 0.0, 10.0);
        let b = segment_record_id("/calls/a.vtt", 0.0, 10.0);
        assert_eq!(a, b);
        assert!(a.starts_with("segment_"));

        let c = segment_record_id("/calls/a.vtt", 0.0, 11.0);
        assert_ne!(a, c);

        assert_ne!(
            summary_record_id("/calls/a.vtt"),
            summary_record_id("/calls/b.vtt")
        );
    }

    #[test]
    fn test_is_transcript_file() {
        assert!(is_transcript_file(Path::new("/calls/a.vtt")));
        assert!(is_transcript_file(Path::new("/calls/a.VTT")));
        assert!(!is_transcript_file(Path::new("/calls/a.txt")));
        assert!(!is_transcript_file(Path::new("/calls/.hidden.vtt")));
    }
}
