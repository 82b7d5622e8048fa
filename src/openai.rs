//! Shared OpenAI client construction.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Request timeout for embedding calls. A full batch window of long chunks
/// can take a while, but nothing like a chat completion.
pub const EMBEDDING_TIMEOUT: Duration = Duration::from_secs(120);

/// Request timeout for summary generation. Hour-long calls routinely take
/// minutes to summarize.
pub const SUMMARY_TIMEOUT: Duration = Duration::from_secs(300);

/// Create an OpenAI client with the given request timeout.
///
/// Credentials come from `OPENAI_API_KEY`; `OPENAI_API_BASE` may point the
/// client at a compatible local model runtime instead.
pub fn create_client(timeout: Duration) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::default();
    if let Ok(base) = std::env::var("OPENAI_API_BASE") {
        config = config.with_api_base(base);
    }

    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(config).with_http_client(http_client)
}
