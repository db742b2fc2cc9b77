//! STDIO transport implementation.
//!
//! The MCP channel owns stdout, so all logging goes to stderr.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Serve a single client over stdin/stdout until it disconnects.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        let tools = server.tool_count();
        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        info!("Ready - serving {} tools via stdin/stdout", tools);

        let reason = service
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))?;

        info!("STDIO session ended: {:?}", reason);
        Ok(())
    }
}
