//! Watch command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::indexer::{IndexOutcome, Indexer};
use crate::watcher::{TranscriptWatcher, WatchEvent};
use anyhow::Result;

/// Index the transcript directory, then watch it for changes until Ctrl+C.
pub async fn run_watch(settings: Settings) -> Result<()> {
    let indexer = Indexer::from_settings(&settings)?;
    indexer.store().initialize().await?;

    let transcript_dir = settings.transcript_dir();
    std::fs::create_dir_all(&transcript_dir)?;

    Output::info(&format!(
        "Scanning {} for unindexed transcripts...",
        transcript_dir.display()
    ));
    let outcome = indexer.index_directory(&transcript_dir, false).await?;
    Output::success(&format!(
        "Startup scan: {} indexed, {} skipped, {} failed.",
        outcome.indexed, outcome.skipped, outcome.failed
    ));

    let mut watcher = TranscriptWatcher::start(&transcript_dir)?;
    Output::info(&format!(
        "Watching {} (Ctrl+C to stop)...",
        transcript_dir.display()
    ));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                Output::info("Stopping watcher.");
                return Ok(());
            }
            event = watcher.next_event() => {
                let Some(event) = event else {
                    Output::warning("Watcher stopped unexpectedly.");
                    return Ok(());
                };
                handle_event(&indexer, event).await;
            }
        }
    }
}

async fn handle_event(indexer: &Indexer, event: WatchEvent) {
    let result = match event {
        WatchEvent::Ready => {
            Output::success("Watcher ready.");
            Ok(())
        }
        WatchEvent::Added(path) => {
            Output::info(&format!("New transcript: {}", path.display()));
            indexer.index_file(&path, false).await.map(report_outcome)
        }
        WatchEvent::Changed(path) => {
            Output::info(&format!("Transcript changed: {}", path.display()));
            indexer.index_file(&path, true).await.map(report_outcome)
        }
        WatchEvent::Deleted(path) => {
            let key = path.to_string_lossy().into_owned();
            match indexer.store().delete_by_path(&key).await {
                Ok(deleted) => {
                    Output::info(&format!("Removed {} records for {}", deleted, key));
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        WatchEvent::Error(message) => {
            Output::warning(&format!("Watcher: {}", message));
            Ok(())
        }
    };

    if let Err(e) = result {
        Output::error(&format!("Failed to handle change: {}", e));
    }
}

fn report_outcome(outcome: IndexOutcome) {
    match outcome {
        IndexOutcome::Indexed { records } => {
            Output::success(&format!("Indexed ({} records).", records));
        }
        IndexOutcome::Skipped(reason) => {
            Output::info(&format!("Skipped: {:?}", reason));
        }
    }
}
