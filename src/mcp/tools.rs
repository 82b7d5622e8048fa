//! MCP tool definitions for Samtale.

use super::protocol::Tool;
use serde_json::json;

/// Get all available tools.
pub fn get_tools(default_limit: usize) -> Vec<Tool> {
    vec![Tool {
        name: "query_transcripts".to_string(),
        description: "Search indexed call transcripts with a natural language question. \
            Returns relevant excerpts grouped by call, with client, date, speaker, and \
            relevance scores."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "Natural language question about the calls"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results",
                    "default": default_limit
                },
                "minScore": {
                    "type": "number",
                    "description": "Minimum similarity score (0.0-1.0)",
                    "default": 0.0
                }
            },
            "required": ["question"]
        }),
    }]
}
