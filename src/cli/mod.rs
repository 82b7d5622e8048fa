//! CLI module for Samtale.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Samtale - Call Transcript Search
///
/// Indexes VTT call transcripts into a vector database and answers
/// natural-language questions about them. The name "Samtale" is the
/// Norwegian word for "conversation."
#[derive(Parser, Debug)]
#[command(name = "samtale")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Samtale and verify configuration
    Init,

    /// Index transcripts that are not yet in the vector store
    Index {
        /// A specific .vtt file or directory (defaults to the configured
        /// transcript directory)
        path: Option<PathBuf>,

        /// Re-index even if already present
        #[arg(short, long)]
        force: bool,
    },

    /// Force re-indexing of one file, or of everything
    Reindex {
        /// A .vtt file path, or 'all' for the whole transcript directory
        target: String,
    },

    /// Ask a question about your indexed calls
    Query {
        /// The question to ask
        question: String,

        /// Maximum number of results (default depends on indexing mode)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long)]
        min_score: Option<f32>,
    },

    /// Watch the transcript directory and keep the index current
    Watch,

    /// Start MCP server for AI assistant integration (Claude, etc.)
    Mcp,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "indexing.mode")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
