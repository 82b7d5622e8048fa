//! OpenAI embeddings implementation.

use super::{ensure_normalized, retry_delay, Embedder};
use crate::error::{Result, SamtaleError};
use crate::openai::{create_client, EMBEDDING_TIMEOUT};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Pause between successful batch windows, so a local model runtime is not
/// flooded with back-to-back requests.
const INTER_WINDOW_DELAY: Duration = Duration::from_millis(50);

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
    batch_size: usize,
    max_retries: u32,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder with default settings.
    pub fn new() -> Self {
        Self::with_config("text-embedding-3-small", 1536, 100, 3)
    }

    /// Create a new OpenAI embedder with custom model and batching behavior.
    pub fn with_config(model: &str, dimensions: usize, batch_size: usize, max_retries: u32) -> Self {
        Self {
            client: create_client(EMBEDDING_TIMEOUT),
            model: model.to_string(),
            dimensions,
            batch_size: batch_size.max(1),
            max_retries: max_retries.max(1),
        }
    }

    /// Embed one window of texts, without retries.
    async fn embed_window(&self, window: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(window.to_vec()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| SamtaleError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| SamtaleError::OpenAI(format!("Embedding API error: {}", e)))?;

        // Sort by index to ensure correct order
        let mut data: Vec<_> = response.data.into_iter().collect();
        data.sort_by_key(|e| e.index);

        let mut embeddings = Vec::with_capacity(data.len());
        for item in data {
            let mut embedding = item.embedding;
            ensure_normalized(&mut embedding);
            embeddings.push(embedding);
        }

        Ok(embeddings)
    }
}

impl Default for OpenAIEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SamtaleError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        let window_count = texts.len().div_ceil(self.batch_size);

        for (window_index, window) in texts.chunks(self.batch_size).enumerate() {
            let mut last_error = None;

            for attempt in 1..=self.max_retries {
                match self.embed_window(window).await {
                    Ok(embeddings) => {
                        all_embeddings.extend(embeddings);
                        last_error = None;
                        break;
                    }
                    Err(e) => {
                        warn!(
                            "Embedding window {}/{} failed on attempt {}/{}: {}",
                            window_index + 1,
                            window_count,
                            attempt,
                            self.max_retries,
                            e
                        );
                        last_error = Some(e);
                        if attempt < self.max_retries {
                            tokio::time::sleep(retry_delay(attempt)).await;
                        }
                    }
                }
            }

            if let Some(e) = last_error {
                return Err(SamtaleError::EmbeddingRetriesExhausted {
                    attempts: self.max_retries,
                    message: e.to_string(),
                });
            }

            // Brief pause between windows; part of the pacing contract
            if window_index + 1 < window_count {
                tokio::time::sleep(INTER_WINDOW_DELAY).await;
            }
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let embedder = OpenAIEmbedder::new();
        assert_eq!(embedder.dimensions(), 1536);

        let embedder = OpenAIEmbedder::with_config("text-embedding-3-large", 3072, 50, 5);
        assert_eq!(embedder.dimensions(), 3072);
    }

    #[test]
    fn test_batch_size_floor() {
        let embedder = OpenAIEmbedder::with_config("text-embedding-3-small", 1536, 0, 0);
        assert_eq!(embedder.batch_size, 1);
        assert_eq!(embedder.max_retries, 1);
    }
}
