//! polysearch: multi-strategy record search and ranking
//!
//! The engine lives in [`search`]; the remaining modules make up the
//! command-line and MCP server front ends of the `polysearch` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod search;
pub mod tools;

pub use search::{search, Record, SearchMethod, SearchOptions, SearchResponse};
