//! Test client: connects to the server over Streamable HTTP and lets an
//! operator call tools directly or through a Gemini agent.

pub mod agent;
pub mod config;
pub mod error;
pub mod repl;
pub mod session;

pub use agent::{AgentSettings, GeminiAgent};
pub use config::ClientArgs;
pub use error::{ClientError, ClientResult};
pub use repl::Repl;
pub use session::McpSession;
