//! MCP tools implementation

pub mod search;
