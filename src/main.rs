//! Samtale CLI entry point.

use anyhow::Result;
use clap::Parser;
use samtale::cli::{commands, Cli, Commands};
use samtale::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Logs go to stderr; stdout carries command output and, in MCP mode,
    // the JSON-RPC stream.
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("samtale={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Index { path, force } => {
            commands::run_index(path.as_deref(), *force, settings).await?;
        }

        Commands::Reindex { target } => {
            commands::run_reindex(target, settings).await?;
        }

        Commands::Query {
            question,
            limit,
            min_score,
        } => {
            commands::run_query(question, *limit, *min_score, settings).await?;
        }

        Commands::Watch => {
            commands::run_watch(settings).await?;
        }

        Commands::Mcp => {
            commands::run_mcp(settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
