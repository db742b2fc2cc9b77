//! Domains module containing business logic organized by bounded contexts.
//!
//! The server currently has a single domain: the tools MCP clients can call.

pub mod tools;
