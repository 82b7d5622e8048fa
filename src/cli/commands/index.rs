//! Index command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::indexer::{IndexOutcome, Indexer, SkipReason};
use anyhow::Result;
use std::path::Path;

/// Run the index command for a single file or a directory.
pub async fn run_index(path: Option<&Path>, force: bool, settings: Settings) -> Result<()> {
    let indexer = Indexer::from_settings(&settings)?;
    indexer.store().initialize().await?;

    let transcript_dir = settings.transcript_dir();
    let target = path.unwrap_or(&transcript_dir);

    if target.is_file() {
        index_one(&indexer, target, force).await
    } else {
        index_all(&indexer, target, force).await
    }
}

async fn index_one(indexer: &Indexer, path: &Path, force: bool) -> Result<()> {
    let spinner = Output::spinner(&format!("Indexing {}...", path.display()));
    let outcome = indexer.index_file(path, force).await;
    spinner.finish_and_clear();

    match outcome? {
        IndexOutcome::Indexed { records } => {
            Output::success(&format!(
                "Indexed {} ({} records).",
                path.display(),
                records
            ));
        }
        IndexOutcome::Skipped(SkipReason::AlreadyIndexed) => {
            Output::info(&format!(
                "{} is already indexed. Use --force to re-index.",
                path.display()
            ));
        }
        IndexOutcome::Skipped(reason) => {
            Output::warning(&format!("Skipped {}: {:?}", path.display(), reason));
        }
    }
    Ok(())
}

async fn index_all(indexer: &Indexer, dir: &Path, force: bool) -> Result<()> {
    Output::info(&format!("Indexing transcripts in {}...", dir.display()));

    let spinner = Output::spinner("Scanning and indexing...");
    let outcome = indexer.index_directory(dir, force).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    Output::success(&format!(
        "Done: {} indexed, {} skipped, {} failed.",
        outcome.indexed, outcome.skipped, outcome.failed
    ));
    if let Ok(total) = indexer.store().count().await {
        Output::kv("Records in collection", &total.to_string());
    }
    if outcome.failed > 0 {
        Output::warning("Some files failed; see the log for details.");
    }
    Ok(())
}
