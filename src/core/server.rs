//! MCP Server implementation and lifecycle management.
//!
//! The server handler advertises the tool table and forwards every
//! `tools/call` to the tool registry. Tool failures come back as tool results
//! flagged `isError`, so a failing call never tears down the session.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use tracing::{info, instrument, warn};

use super::config::Config;
use super::error::Result;
use crate::domains::tools::{ToolContext, ToolRegistry};

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Static tool table, built once at startup.
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    ///
    /// Builds the outbound HTTP client and provider clients; fails only if the
    /// HTTP client cannot be constructed.
    pub fn new(config: Config) -> Result<Self> {
        let context = ToolContext::from_config(&config)?;
        Ok(Self::with_context(config, context))
    }

    /// Create a server around an existing tool context.
    pub fn with_context(config: Config, context: ToolContext) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ToolRegistry::new(context)),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.registry.tools().len()
    }

    /// Invoke a tool and shape the outcome as an MCP tool result.
    pub async fn invoke(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        match self.registry.dispatch(name, arguments.unwrap_or_default()).await {
            Ok(payload) => CallToolResult::structured(payload),
            Err(e) => {
                warn!(tool = name, kind = e.kind(), "Tool call failed: {}", e);
                e.into_call_result()
            }
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Spotify and Last.fm tools: search the catalogue, read the user's profile, \
                 top tracks and playlists, create and fill playlists, control playback, \
                 and find similar tracks or artists. Paged tools return next_offset when \
                 more results exist."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult::with_all_items(self.registry.tools().to_vec()))
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("Calling tool");
        Ok(self.invoke(&request.name, request.arguments).await)
    }
}
