//! CLI command implementations.

mod config;
mod index;
mod init;
mod mcp;
mod query;
mod reindex;
mod watch;

pub use config::run_config;
pub use index::run_index;
pub use init::run_init;
pub use mcp::run_mcp;
pub use query::run_query;
pub use reindex::run_reindex;
pub use watch::run_watch;
