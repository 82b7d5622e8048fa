//! Error types for Samtale.

use thiserror::Error;

/// Library-level error type for Samtale operations.
#[derive(Error, Debug)]
pub enum SamtaleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Embedding batch failed after {attempts} attempts: {message}")]
    EmbeddingRetriesExhausted { attempts: u32, message: String },

    #[error("Summary generation failed: {0}")]
    Summary(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("File watcher error: {0}")]
    Watcher(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

/// Result type alias for Samtale operations.
pub type Result<T> = std::result::Result<T, SamtaleError>;
