//! Query command implementation.

use crate::cli::output::format_time_range;
use crate::cli::Output;
use crate::config::Settings;
use crate::query::QueryTool;
use anyhow::Result;

/// Run the query command.
pub async fn run_query(
    question: &str,
    limit: Option<usize>,
    min_score: Option<f32>,
    settings: Settings,
) -> Result<()> {
    let limit = limit.unwrap_or_else(|| settings.default_query_limit());
    let min_score = min_score.unwrap_or(settings.query.min_score);

    let tool = QueryTool::from_settings(&settings);

    let spinner = Output::spinner("Searching transcripts...");
    let result = tool.query(question, limit, min_score).await;
    spinner.finish_and_clear();
    let result = result?;

    println!("{}", result.answer);

    if !result.results.is_empty() {
        Output::header("Matches");
        for hit in &result.results {
            Output::search_result(
                &hit.metadata.file_name,
                &format_time_range(hit.metadata.start_time, hit.metadata.end_time),
                hit.score,
                &hit.text,
            );
        }
    }

    Ok(())
}
