//! Debounced transcript-directory watcher.
//!
//! Filesystem events are debounced so a transcript being written in several
//! flushes produces one event once it has settled. Raw notifications carry no
//! reliable added/changed distinction across platforms, so events are
//! classified against a known-file set seeded from the directory's contents
//! at startup.

use crate::error::{Result, SamtaleError};
use crate::indexer::is_transcript_file;
use notify_debouncer_mini::{new_debouncer, notify, DebounceEventResult, Debouncer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How long a path must stay quiet before its event is delivered.
pub const DEBOUNCE_INTERVAL: Duration = Duration::from_secs(1);

/// Channel capacity; beyond this the watcher thread blocks rather than drop
/// events.
const EVENT_BUFFER: usize = 64;

/// A settled change in the transcript directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The watcher is installed and delivering events.
    Ready,
    /// A transcript file appeared.
    Added(PathBuf),
    /// An existing transcript file was modified.
    Changed(PathBuf),
    /// A transcript file was removed.
    Deleted(PathBuf),
    /// The watcher backend reported an error; watching continues.
    Error(String),
}

/// Running watcher over one transcript directory.
///
/// Dropping the watcher stops it; the event channel closes once the last
/// buffered event has been consumed.
pub struct TranscriptWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    events: mpsc::Receiver<WatchEvent>,
}

impl TranscriptWatcher {
    /// Start watching `dir` (non-recursive) with the default debounce.
    pub fn start(dir: &Path) -> Result<Self> {
        Self::start_with_debounce(dir, DEBOUNCE_INTERVAL)
    }

    /// Start watching `dir` with a custom debounce interval.
    pub fn start_with_debounce(dir: &Path, debounce: Duration) -> Result<Self> {
        if !dir.is_dir() {
            return Err(SamtaleError::Watcher(format!(
                "Not a directory: {}",
                dir.display()
            )));
        }

        let known = Mutex::new(scan_known_files(dir)?);
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let ready_tx = tx.clone();

        let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        if let Some(classified) = classify(&known, &event.path) {
                            debug!("Watch event: {:?}", classified);
                            if tx.blocking_send(classified).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("Watcher backend error: {}", e);
                    let _ = tx.blocking_send(WatchEvent::Error(e.to_string()));
                }
            }
        })
        .map_err(|e| SamtaleError::Watcher(format!("Failed to create watcher: {}", e)))?;

        debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::NonRecursive)
            .map_err(|e| {
                SamtaleError::Watcher(format!("Failed to watch {}: {}", dir.display(), e))
            })?;

        // Ready is the first event out; the buffer is empty at this point
        let _ = ready_tx.try_send(WatchEvent::Ready);

        info!("Watching {} for transcript changes", dir.display());
        Ok(Self {
            _debouncer: debouncer,
            events: rx,
        })
    }

    /// Receive the next settled event, or None once the watcher has stopped.
    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }
}

/// Decide what a debounced notification for `path` means. Non-transcript
/// paths (wrong extension, dotfiles) produce nothing.
fn classify(known: &Mutex<HashSet<PathBuf>>, path: &Path) -> Option<WatchEvent> {
    if !is_transcript_file(path) {
        return None;
    }

    let mut known = known.lock().unwrap();
    if path.exists() {
        if known.insert(path.to_path_buf()) {
            Some(WatchEvent::Added(path.to_path_buf()))
        } else {
            Some(WatchEvent::Changed(path.to_path_buf()))
        }
    } else if known.remove(path) {
        Some(WatchEvent::Deleted(path.to_path_buf()))
    } else {
        // Created and deleted within one debounce window
        None
    }
}

/// Transcript files already present when watching begins.
fn scan_known_files(dir: &Path) -> Result<HashSet<PathBuf>> {
    let mut known = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if is_transcript_file(&path) {
            known.insert(path);
        }
    }
    Ok(known)
}
