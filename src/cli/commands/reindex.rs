//! Reindex command implementation.

use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Force re-indexing of one file, or of the whole transcript directory when
/// `target` is "all".
pub async fn run_reindex(target: &str, settings: Settings) -> Result<()> {
    if target.eq_ignore_ascii_case("all") {
        super::run_index(None, true, settings).await
    } else {
        super::run_index(Some(Path::new(target)), true, settings).await
    }
}
