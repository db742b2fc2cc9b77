//! MCP session over Streamable HTTP.

use rmcp::{
    ServiceExt,
    model::{CallToolRequestParam, CallToolResult, RawContent, Tool},
    service::{RoleClient, RunningService},
    transport::StreamableHttpClientTransport,
};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::error::{ClientError, ClientResult};

/// Outcome of one tool call as seen by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub is_error: bool,
    pub payload: Value,
}

/// A connected MCP client session.
pub struct McpSession {
    service: RunningService<RoleClient, ()>,
    tools: Vec<Tool>,
}

impl McpSession {
    /// Connect to `endpoint` and fetch the tool list.
    pub async fn connect(endpoint: &str) -> ClientResult<Self> {
        info!("Connecting to {}", endpoint);
        let transport = StreamableHttpClientTransport::from_uri(endpoint.to_string());
        let service = ()
            .serve(transport)
            .await
            .map_err(|e| ClientError::Mcp(format!("failed to connect to {}: {}", endpoint, e)))?;

        let tools = service
            .list_all_tools()
            .await
            .map_err(|e| ClientError::Mcp(e.to_string()))?;
        info!("Server offers {} tools", tools.len());

        Ok(Self { service, tools })
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Invoke a tool. Tool-level failures are returned as an outcome with
    /// `is_error` set; only protocol failures are errors.
    pub async fn call(&self, name: &str, arguments: Value) -> ClientResult<ToolOutcome> {
        let arguments = match arguments {
            Value::Null => json!({}),
            Value::Object(_) => arguments,
            other => {
                return Err(ClientError::Config(format!(
                    "tool arguments must be a JSON object, got {}",
                    other
                )));
            }
        };

        debug!("Calling {} with {}", name, arguments);
        let request: CallToolRequestParam =
            serde_json::from_value(json!({ "name": name, "arguments": arguments }))?;
        let result = self
            .service
            .call_tool(request)
            .await
            .map_err(|e| ClientError::Mcp(e.to_string()))?;

        Ok(outcome(result))
    }

    /// Close the session.
    pub async fn close(self) -> ClientResult<()> {
        self.service
            .cancel()
            .await
            .map_err(|e| ClientError::Mcp(e.to_string()))?;
        Ok(())
    }
}

/// Prefer structured content; fall back to the text blocks, parsed as JSON
/// when possible.
fn outcome(result: CallToolResult) -> ToolOutcome {
    let is_error = result.is_error.unwrap_or(false);
    if let Some(payload) = result.structured_content {
        return ToolOutcome { is_error, payload };
    }

    let text: Vec<String> = result
        .content
        .into_iter()
        .filter_map(|content| match content.raw {
            RawContent::Text(text) => Some(text.text),
            _ => None,
        })
        .collect();
    let joined = text.join("\n");
    let payload = serde_json::from_str(&joined).unwrap_or(Value::String(joined));

    ToolOutcome { is_error, payload }
}
