//! Configuration module for Samtale.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, IndexingMode, IndexingSettings,
    QuerySettings, Settings, SummarySettings, TranscriptSettings, VectorStoreSettings,
};
