//! Configuration settings for Samtale.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcripts: TranscriptSettings,
    pub indexing: IndexingSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub summary: SummarySettings,
    pub vector_store: VectorStoreSettings,
    pub query: QuerySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            transcripts: TranscriptSettings::default(),
            indexing: IndexingSettings::default(),
            chunking: ChunkingSettings::default(),
            embedding: EmbeddingSettings::default(),
            summary: SummarySettings::default(),
            vector_store: VectorStoreSettings::default(),
            query: QuerySettings::default(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.samtale".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Transcript input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Directory containing VTT transcript files (also the watch root).
    pub directory: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            directory: "~/transcripts".to_string(),
        }
    }
}

/// Indexing granularity.
///
/// Segment mode stores many overlapping chunks per file; summary mode stores
/// one LLM-generated structured summary per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexingMode {
    #[default]
    Segment,
    Summary,
}

impl std::str::FromStr for IndexingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "segment" | "segments" => Ok(IndexingMode::Segment),
            "summary" | "summaries" => Ok(IndexingMode::Summary),
            _ => Err(format!("Unknown indexing mode: {}", s)),
        }
    }
}

impl std::fmt::Display for IndexingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexingMode::Segment => write!(f, "segment"),
            IndexingMode::Summary => write!(f, "summary"),
        }
    }
}

/// Indexing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    /// Indexing granularity (segment, summary).
    pub mode: IndexingMode,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            mode: IndexingMode::Segment,
        }
    }
}

/// Chunking settings (segment mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum words per chunk.
    pub max_words: usize,
    /// Word-count overlap between consecutive chunks.
    pub overlap_words: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_words: 750,
            overlap_words: 50,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Batch window size for embedding requests.
    pub batch_size: usize,
    /// Maximum retries per batch window.
    pub max_retries: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 100,
            max_retries: 3,
        }
    }
}

/// Structured summary settings (summary mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// LLM model for summary generation.
    pub model: String,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo".to_string(),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Base URL of the Chroma server.
    pub url: String,
    /// Collection for segment-mode records.
    pub segment_collection: String,
    /// Collection for summary-mode records.
    pub summary_collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            segment_collection: "transcripts".to_string(),
            summary_collection: "transcript_summaries".to_string(),
        }
    }
}

/// Query tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Minimum similarity score (0.0 lets everything through; the query
    /// tool presentation layer does the trimming).
    pub min_score: f32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { min_score: 0.0 }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SamtaleError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("samtale")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded transcript directory path.
    pub fn transcript_dir(&self) -> PathBuf {
        Self::expand_path(&self.transcripts.directory)
    }

    /// Collection name for the configured indexing mode.
    pub fn collection_name(&self) -> &str {
        match self.indexing.mode {
            IndexingMode::Segment => &self.vector_store.segment_collection,
            IndexingMode::Summary => &self.vector_store.summary_collection,
        }
    }

    /// Default result limit for the configured indexing mode.
    pub fn default_query_limit(&self) -> usize {
        match self.indexing.mode {
            IndexingMode::Segment => 10,
            IndexingMode::Summary => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.max_words, 750);
        assert_eq!(settings.chunking.overlap_words, 50);
        assert_eq!(settings.embedding.dimensions, 1536);
        assert_eq!(settings.indexing.mode, IndexingMode::Segment);
        assert_eq!(settings.collection_name(), "transcripts");
        assert_eq!(settings.default_query_limit(), 10);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("segment".parse::<IndexingMode>().unwrap(), IndexingMode::Segment);
        assert_eq!("Summary".parse::<IndexingMode>().unwrap(), IndexingMode::Summary);
        assert!("chunked".parse::<IndexingMode>().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [indexing]
            mode = "summary"

            [chunking]
            max_words = 500
            "#,
        )
        .unwrap();

        assert_eq!(settings.indexing.mode, IndexingMode::Summary);
        assert_eq!(settings.chunking.max_words, 500);
        // Untouched sections keep their defaults
        assert_eq!(settings.chunking.overlap_words, 50);
        assert_eq!(settings.collection_name(), "transcript_summaries");
        assert_eq!(settings.default_query_limit(), 5);
    }
}
