//! Samtale - Call Transcript Indexing and Retrieval
//!
//! A local-first tool for indexing call-transcript VTT files into a vector
//! store and answering natural-language questions about them.
//!
//! The name "Samtale" comes from the Norwegian word for "conversation."
//!
//! # Overview
//!
//! Samtale allows you to:
//! - Index timestamped VTT call transcripts into a Chroma vector database
//! - Watch a directory and keep the index up to date as files change
//! - Query your call history semantically via CLI or an MCP tool server
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `transcript` - VTT parsing and metadata extraction
//! - `chunking` - Word-bounded chunking of transcript segments
//! - `embedding` - Embedding generation
//! - `summary` - Structured call summaries
//! - `vector_store` - Vector database abstraction
//! - `indexer` - Indexing orchestration
//! - `watcher` - Directory watching for automatic indexing
//! - `query` - Natural-language query tool
//! - `mcp` - MCP (stdio JSON-RPC) server
//!
//! # Example
//!
//! ```rust,no_run
//! use samtale::config::Settings;
//! use samtale::indexer::Indexer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let indexer = Indexer::from_settings(&settings)?;
//!
//!     let outcome = indexer.index_directory(&settings.transcript_dir(), false).await?;
//!     println!("Indexed {} files", outcome.indexed);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod indexer;
pub mod mcp;
pub mod openai;
pub mod query;
pub mod summary;
pub mod transcript;
pub mod vector_store;
pub mod watcher;

pub use error::{Result, SamtaleError};
