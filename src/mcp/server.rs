//! MCP server implementation.
//!
//! Besides answering tool calls, initialization starts the background
//! indexing pipeline: a startup scan of the transcript directory followed by
//! a debounced watcher that keeps the index current while the server runs.

use super::protocol::*;
use super::tools::get_tools;
use crate::config::Settings;
use crate::indexer::Indexer;
use crate::query::QueryTool;
use crate::watcher::{TranscriptWatcher, WatchEvent};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "samtale";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for Samtale.
pub struct McpServer {
    settings: Settings,
    query_tool: Option<QueryTool>,
    pipeline: Option<tokio::task::JoinHandle<()>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            query_tool: None,
            pipeline: None,
        }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    ///
    /// All logging goes to stderr; stdout carries only JSON-RPC.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        info!("Samtale MCP server starting");

        for line in stdin.lock().lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    let response = JsonRpcResponse::error(None, -32700, "Parse error");
                    writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
                    stdout.flush()?;
                    continue;
                }
            };

            let response = self.handle_request(request).await;
            writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
            stdout.flush()?;
        }

        if let Some(pipeline) = self.pipeline.take() {
            pipeline.abort();
        }
        Ok(())
    }

    /// Handle a single JSON-RPC request.
    async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "initialized" => {
                // Notification, no response needed but we'll send empty success
                JsonRpcResponse::success(request.id, json!({}))
            }
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(
                request.id,
                -32601,
                &format!("Method not found: {}", request.method),
            ),
        }
    }

    /// Handle initialize: build the query pipeline and start background
    /// indexing.
    fn handle_initialize(&mut self, id: Option<Value>) -> JsonRpcResponse {
        let indexer = match Indexer::from_settings(&self.settings) {
            Ok(indexer) => Arc::new(indexer),
            Err(e) => {
                error!("Failed to initialize indexer: {}", e);
                return JsonRpcResponse::error(id, -32000, &format!("Init failed: {}", e));
            }
        };
        self.query_tool = Some(QueryTool::from_settings(&self.settings));

        let transcript_dir = self.settings.transcript_dir();
        self.pipeline = Some(tokio::spawn(run_pipeline(indexer, transcript_dir)));

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, -32603, &e.to_string()),
        }
    }

    /// Handle tools/list request.
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: get_tools(self.settings.default_query_limit()),
        };
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, -32603, &e.to_string()),
        }
    }

    /// Handle tools/call request.
    async fn handle_tools_call(
        &self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, &format!("Invalid params: {}", e))
                }
            },
            None => return JsonRpcResponse::error(id, -32602, "Missing params"),
        };

        let result = match params.name.as_str() {
            "query_transcripts" => self.tool_query_transcripts(params.arguments).await,
            _ => ToolCallResult::error(format!("Unknown tool: {}", params.name)),
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, -32603, &e.to_string()),
        }
    }

    /// The query_transcripts tool.
    async fn tool_query_transcripts(&self, args: Option<Value>) -> ToolCallResult {
        let args = match args {
            Some(a) => a,
            None => return ToolCallResult::error("Missing arguments".to_string()),
        };

        let question = match args.get("question").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolCallResult::error("Missing 'question' argument".to_string()),
        };

        let limit = args
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|l| l as usize)
            .unwrap_or_else(|| self.settings.default_query_limit());
        let min_score = args
            .get("minScore")
            .and_then(|v| v.as_f64())
            .map(|s| s as f32)
            .unwrap_or(self.settings.query.min_score);

        let query_tool = match &self.query_tool {
            Some(tool) => tool,
            None => return ToolCallResult::error("Server not initialized".to_string()),
        };

        match query_tool.query(question, limit, min_score).await {
            Ok(result) => ToolCallResult::text(result.answer),
            Err(e) => ToolCallResult::error(format!("Query failed: {}", e)),
        }
    }
}

/// Background pipeline: index what is already on disk, then keep up with
/// filesystem changes until the task is aborted.
async fn run_pipeline(indexer: Arc<Indexer>, transcript_dir: PathBuf) {
    if let Err(e) = indexer.store().initialize().await {
        error!("Failed to initialize vector store: {}", e);
        return;
    }

    match indexer.index_directory(&transcript_dir, false).await {
        Ok(outcome) => info!(
            "Startup scan complete: {} indexed, {} skipped, {} failed",
            outcome.indexed, outcome.skipped, outcome.failed
        ),
        Err(e) => error!("Startup scan failed: {}", e),
    }

    let mut watcher = match TranscriptWatcher::start(&transcript_dir) {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("Failed to start file watcher: {}", e);
            return;
        }
    };

    while let Some(event) = watcher.next_event().await {
        let result = match event {
            WatchEvent::Ready => {
                info!("Watching {} for transcript changes", transcript_dir.display());
                Ok(())
            }
            WatchEvent::Added(path) => indexer.index_file(&path, false).await.map(|_| ()),
            WatchEvent::Changed(path) => indexer.index_file(&path, true).await.map(|_| ()),
            WatchEvent::Deleted(path) => {
                let key = path.to_string_lossy().into_owned();
                indexer.store().delete_by_path(&key).await.map(|deleted| {
                    info!("Removed {} records for deleted file {}", deleted, key);
                })
            }
            WatchEvent::Error(message) => {
                warn!("Watcher reported: {}", message);
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("Failed to handle watch event: {}", e);
        }
    }
}
