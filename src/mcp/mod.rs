//! MCP (Model Context Protocol) server for Samtale.
//!
//! Exposes transcript search to AI assistants as a single tool over
//! JSON-RPC 2.0 on stdio.

mod protocol;
mod server;
mod tools;

pub use server::McpServer;
