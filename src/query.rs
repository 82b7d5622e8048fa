//! Natural-language queries against indexed transcripts.
//!
//! Embeds the question, searches the vector store, and renders the hits as a
//! readable markdown answer alongside the raw scored records.

use crate::config::{IndexingMode, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::vector_store::{ChromaVectorStore, ScoredRecord, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Answer returned when the search comes back empty.
const NO_RESULTS_ANSWER: &str = "No relevant transcript segments found for your query.";

/// Snippets shown per source file in a segment-mode answer.
const SNIPPETS_PER_FILE: usize = 3;

/// Above this many total hits the answer notes it is truncated.
const FOOTER_THRESHOLD: usize = 5;

/// A formatted answer plus the scored records it was rendered from.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub answer: String,
    pub results: Vec<ScoredRecord>,
}

/// Query pipeline: question in, formatted answer out.
pub struct QueryTool {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    mode: IndexingMode,
}

impl QueryTool {
    /// Create a query tool from settings, backed by OpenAI embeddings and
    /// the Chroma collection for the configured mode.
    pub fn from_settings(settings: &Settings) -> Self {
        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
            settings.embedding.batch_size,
            settings.embedding.max_retries,
        ));
        let store = Arc::new(ChromaVectorStore::new(
            &settings.vector_store.url,
            settings.collection_name(),
        ));
        Self::new(embedder, store, settings.indexing.mode)
    }

    /// Create a query tool with custom components.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        mode: IndexingMode,
    ) -> Self {
        Self {
            embedder,
            store,
            mode,
        }
    }

    /// Answer a natural-language question.
    ///
    /// Pure semantic search: no metadata pre-filtering, just the `limit`
    /// nearest records above `min_score`.
    #[instrument(skip(self), fields(limit, min_score))]
    pub async fn query(
        &self,
        question: &str,
        limit: usize,
        min_score: f32,
    ) -> Result<QueryResult> {
        debug!("Embedding query text");
        let query_embedding = self.embedder.embed(question).await?;

        let results = self.store.search(&query_embedding, limit, min_score).await?;
        debug!("Search returned {} results", results.len());

        if results.is_empty() {
            return Ok(QueryResult {
                answer: NO_RESULTS_ANSWER.to_string(),
                results,
            });
        }

        let answer = match self.mode {
            IndexingMode::Segment => format_segment_answer(&results),
            IndexingMode::Summary => format_summary_answer(&results),
        };

        Ok(QueryResult { answer, results })
    }
}

/// Render segment hits grouped by source file, in first-seen (score-
/// descending) order, with up to three snippets per file.
fn format_segment_answer(results: &[ScoredRecord]) -> String {
    let mut groups: Vec<(&str, Vec<&ScoredRecord>)> = Vec::new();
    for result in results {
        let file_name = result.metadata.file_name.as_str();
        match groups.iter_mut().find(|(name, _)| *name == file_name) {
            Some((_, members)) => members.push(result),
            None => groups.push((file_name, vec![result])),
        }
    }

    let mut answer =
        String::from("Based on the transcript search, here are the relevant findings:\n\n");

    for (file_name, members) in &groups {
        let first = members[0];
        answer.push_str(&format!("**From {}**", file_name));
        if let Some(client) = &first.metadata.client_name {
            answer.push_str(&format!(" (Client: {})", client));
        }
        if let Some(date) = first.metadata.call_date {
            answer.push_str(&format!(" (Date: {})", date));
        }
        answer.push_str(":\n\n");

        for result in members.iter().take(SNIPPETS_PER_FILE) {
            answer.push_str(&format!("- {}\n", result.text));
            if let Some(speaker) = &result.metadata.speaker {
                answer.push_str(&format!("  (Speaker: {})\n", speaker));
            }
            answer.push_str(&format!("  (Relevance: {:.1}%)\n\n", result.score * 100.0));
        }
    }

    if results.len() > FOOTER_THRESHOLD {
        answer.push_str(&format!(
            "\n*Found {} total relevant segments. Showing top results.*",
            results.len()
        ));
    }

    answer
}

/// Render summary hits: one match is shown verbatim under its file name,
/// several become numbered sections in score order.
fn format_summary_answer(results: &[ScoredRecord]) -> String {
    if results.len() == 1 {
        let only = &results[0];
        return format!("**{}**\n\n{}", only.metadata.file_name, only.text);
    }

    let mut answer = format!("Found {} relevant call summaries:\n\n", results.len());
    for (i, result) in results.iter().enumerate() {
        answer.push_str(&format!(
            "## {}. {} (Relevance: {:.1}%)\n\n{}\n\n---\n\n",
            i + 1,
            result.metadata.file_name,
            result.score * 100.0,
            result.text
        ));
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::{MemoryVectorStore, RecordMetadata, TranscriptRecord};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![self.0.clone(); texts.len()])
        }
        fn dimensions(&self) -> usize {
            self.0.len()
        }
    }

    fn scored(file: &str, text: &str, score: f32, speaker: Option<&str>) -> ScoredRecord {
        ScoredRecord {
            id: format!("{}:{}", file, text.len()),
            text: text.to_string(),
            score,
            metadata: RecordMetadata {
                file_path: format!("/calls/{}", file),
                file_name: file.to_string(),
                client_name: Some("Acme".to_string()),
                call_date: NaiveDate::from_ymd_opt(2024, 1, 15),
                speaker: speaker.map(str::to_string),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_no_results_answer() {
        let tool = QueryTool::new(
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            Arc::new(MemoryVectorStore::new()),
            IndexingMode::Segment,
        );

        let result = tool.query("anything", 10, 0.0).await.unwrap();
        assert_eq!(result.answer, NO_RESULTS_ANSWER);
        assert!(result.results.is_empty());
    }

    #[tokio::test]
    async fn test_query_returns_ranked_records() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .add(&[
                TranscriptRecord {
                    id: "near".to_string(),
                    text: "budget review".to_string(),
                    embedding: vec![1.0, 0.0],
                    metadata: RecordMetadata {
                        file_path: "/calls/a.vtt".to_string(),
                        file_name: "a.vtt".to_string(),
                        ..Default::default()
                    },
                },
                TranscriptRecord {
                    id: "far".to_string(),
                    text: "unrelated".to_string(),
                    embedding: vec![0.0, 1.0],
                    metadata: RecordMetadata {
                        file_path: "/calls/b.vtt".to_string(),
                        file_name: "b.vtt".to_string(),
                        ..Default::default()
                    },
                },
            ])
            .await
            .unwrap();

        let tool = QueryTool::new(
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            store,
            IndexingMode::Segment,
        );

        let result = tool.query("what about the budget", 10, 0.0).await.unwrap();
        assert_eq!(result.results[0].id, "near");
        assert!(result.answer.contains("a.vtt"));
    }

    #[test]
    fn test_segment_answer_groups_by_file() {
        let results = vec![
            scored("a.vtt", "first hit", 0.9, Some("Jane Doe")),
            scored("b.vtt", "other file", 0.8, None),
            scored("a.vtt", "second hit", 0.7, None),
        ];

        let answer = format_segment_answer(&results);
        // One header per file, client and date rendered
        assert_eq!(answer.matches("**From a.vtt**").count(), 1);
        assert!(answer.contains("**From b.vtt**"));
        assert!(answer.contains("(Client: Acme)"));
        assert!(answer.contains("(Date: 2024-01-15)"));
        assert!(answer.contains("(Speaker: Jane Doe)"));
        assert!(answer.contains("(Relevance: 90.0%)"));
        // Only 3 results, no truncation footer
        assert!(!answer.contains("Showing top results"));
    }

    #[test]
    fn test_segment_answer_caps_snippets_and_adds_footer() {
        let mut results: Vec<ScoredRecord> = (0..6)
            .map(|i| scored("a.vtt", &format!("snippet {}", i), 0.9 - i as f32 * 0.1, None))
            .collect();
        results.push(scored("b.vtt", "elsewhere", 0.2, None));

        let answer = format_segment_answer(&results);
        // Top 3 per file
        assert!(answer.contains("snippet 0"));
        assert!(answer.contains("snippet 2"));
        assert!(!answer.contains("snippet 3"));
        assert!(answer.contains("elsewhere"));
        assert!(answer.contains("Found 7 total relevant segments"));
    }

    #[test]
    fn test_summary_answer_single_match() {
        let results = vec![scored("a.vtt", "CALL TYPE: demo\n\nSUMMARY:\nWent well.", 0.9, None)];
        let answer = format_summary_answer(&results);
        assert!(answer.starts_with("**a.vtt**"));
        assert!(answer.contains("CALL TYPE: demo"));
        assert!(!answer.contains("## 1."));
    }

    #[test]
    fn test_summary_answer_multiple_matches() {
        let results = vec![
            scored("a.vtt", "summary one", 0.9, None),
            scored("b.vtt", "summary two", 0.5, None),
        ];
        let answer = format_summary_answer(&results);
        assert!(answer.contains("Found 2 relevant call summaries"));
        assert!(answer.contains("## 1. a.vtt (Relevance: 90.0%)"));
        assert!(answer.contains("## 2. b.vtt (Relevance: 50.0%)"));
        assert!(answer.contains("---"));
    }
}
