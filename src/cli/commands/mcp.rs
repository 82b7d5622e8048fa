//! MCP command implementation.

use crate::config::Settings;
use crate::mcp::McpServer;
use anyhow::Result;
use tracing::info;

/// Run the MCP server over stdio.
pub async fn run_mcp(settings: Settings) -> Result<()> {
    info!(
        "Serving collection '{}' ({} mode)",
        settings.collection_name(),
        settings.indexing.mode
    );
    let mut server = McpServer::new(settings);
    server.run().await
}
