//! Tool Registry - the static table of tools and their dispatch.
//!
//! Every tool is registered once at startup with its name, description,
//! input schema and handler. The table does not change while the server
//! runs, so listing and dispatch need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{FutureExt, future::BoxFuture};
use rmcp::model::{JsonObject, Tool};
use schemars::{JsonSchema, generate::SchemaSettings};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use super::context::ToolContext;
use super::definitions::{
    AddToPlaylistTool, ArtistTopTracksTool, CreatePlaylistTool, CurrentUserProfileTool,
    CurrentUserTopTracksTool, GetCurrentUserPlaylistsTool, GetPlaylistItemsTool,
    GetSimilarArtistsTool, GetSimilarTracksTool, PausePlaybackTool, SearchSpotifyTool,
    StartPlaybackTool,
};
use super::error::{ToolError, ToolResult};

// ============================================================================
// Tool Definition
// ============================================================================

/// A tool callable over MCP.
///
/// `Params` is deserialized from the call arguments and also drives the
/// advertised input schema, so the two cannot drift apart.
#[async_trait]
pub trait ToolDefinition: Send + Sync + 'static {
    /// Tool name as registered in MCP.
    const NAME: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    type Params: DeserializeOwned + JsonSchema + Send;
    type Output: Serialize + Send;

    /// Checks that cannot be expressed in the parameter types (ranges,
    /// mutually exclusive fields). Runs before any provider call.
    fn validate(_params: &Self::Params) -> ToolResult<()> {
        Ok(())
    }

    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output>;

    fn to_tool() -> Tool {
        Tool::new(Self::NAME, Self::DESCRIPTION, input_schema::<Self::Params>())
    }
}

type Handler = for<'a> fn(&'a ToolContext, JsonObject) -> BoxFuture<'a, ToolResult<Value>>;

fn run<'a, T: ToolDefinition>(
    ctx: &'a ToolContext,
    arguments: JsonObject,
) -> BoxFuture<'a, ToolResult<Value>> {
    async move {
        let params = parse_params::<T::Params>(arguments)?;
        T::validate(&params)?;
        let output = T::execute(ctx, params).await?;
        Ok(serde_json::to_value(output)?)
    }
    .boxed()
}

/// JSON schema of a parameter type, with subschemas inlined so that clients
/// which do not resolve `$ref` still see the enumerations.
fn input_schema<P: JsonSchema>() -> Arc<JsonObject> {
    let schema = SchemaSettings::draft2020_12()
        .with(|s| s.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<P>();

    let mut object = match Value::from(schema) {
        Value::Object(object) => object,
        _ => JsonObject::new(),
    };
    object.remove("$schema");
    object
        .entry("type")
        .or_insert_with(|| Value::String("object".to_string()));
    Arc::new(object)
}

/// Deserialize call arguments, reporting shape errors as validation errors.
fn parse_params<P: DeserializeOwned>(arguments: JsonObject) -> ToolResult<P> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ToolError::validation(e.to_string()))
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - the name → schema → handler table.
pub struct ToolRegistry {
    context: ToolContext,
    tools: Vec<Tool>,
    handlers: HashMap<&'static str, Handler>,
}

impl ToolRegistry {
    /// Build the registry with every tool the server offers.
    pub fn new(context: ToolContext) -> Self {
        let mut registry = Self {
            context,
            tools: Vec::new(),
            handlers: HashMap::new(),
        };

        registry.register::<SearchSpotifyTool>();
        registry.register::<ArtistTopTracksTool>();
        registry.register::<CurrentUserProfileTool>();
        registry.register::<CurrentUserTopTracksTool>();
        registry.register::<GetCurrentUserPlaylistsTool>();
        registry.register::<GetPlaylistItemsTool>();
        registry.register::<CreatePlaylistTool>();
        registry.register::<AddToPlaylistTool>();
        registry.register::<StartPlaybackTool>();
        registry.register::<PausePlaybackTool>();
        registry.register::<GetSimilarTracksTool>();
        registry.register::<GetSimilarArtistsTool>();

        registry
    }

    fn register<T: ToolDefinition>(&mut self) {
        self.tools.push(T::to_tool());
        self.handlers.insert(T::NAME, run::<T>);
    }

    /// Tool metadata in registration order.
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_ref()).collect()
    }

    /// Run the named tool against `arguments`.
    ///
    /// Unknown names and malformed arguments fail without any provider call.
    pub async fn dispatch(&self, name: &str, arguments: JsonObject) -> ToolResult<Value> {
        let Some(handler) = self.handlers.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(ToolError::not_found(format!("Unknown tool: {}", name)));
        };
        debug!("Dispatching {}", name);
        handler(&self.context, arguments).await
    }
}
