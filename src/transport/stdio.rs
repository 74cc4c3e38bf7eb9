//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::error::{DataError, DataResult};
use crate::mcp::DataService;
use crate::source::QueryExecutor;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout. Logs must therefore go to stderr.
pub struct StdioTransport {
    executor: QueryExecutor,
}

impl StdioTransport {
    /// Create a new stdio transport serving queries through `executor`.
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DataResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = DataService::new(self.executor);
        let running_service = service.serve(stdio()).await.map_err(|e| {
            DataError::internal(format!("Failed to start stdio transport: {}", e))
        })?;

        tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => info!("Stdio transport completed normally"),
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        return Err(DataError::internal(format!("Stdio transport error: {}", e)));
                    }
                }
            }
            _ = wait_for_signal() => {
                // Blocking stdin reads cannot be cancelled by select!, so exit outright.
                info!("Shutdown signal received, exiting");
                std::process::exit(0);
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
