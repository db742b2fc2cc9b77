//! Tools domain module.
//!
//! Tools are the operations MCP clients can call. Each one maps to a single
//! Spotify or Last.fm endpoint (or a short fixed sequence of them) and
//! reshapes the provider response into a compact record.
//!
//! ## Architecture
//!
//! - `definitions/` - Tool implementations grouped by provider resource
//! - `registry.rs` - Static name → schema → handler table and dispatch
//! - `context.rs` - Provider clients shared by all handlers
//! - `error.rs` - Tool error taxonomy
//!
//! ## Adding a New Tool
//!
//! 1. Implement `ToolDefinition` in a file under `definitions/`
//! 2. Export it from `definitions/mod.rs`
//! 3. Add one `registry.register::<YourTool>()` line to `ToolRegistry::new`

mod context;
pub mod definitions;
mod error;
mod registry;

pub use context::ToolContext;
pub use error::{ToolError, ToolResult};
pub use registry::{ToolDefinition, ToolRegistry};
