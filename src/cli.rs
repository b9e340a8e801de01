//! CLI mode implementation
//!
//! Provides the command-line interface for the search tool

use clap::{Parser, Subcommand, ValueEnum};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Polysearch CLI
#[derive(Parser)]
#[command(name = "polysearch")]
#[command(about = "Multi-strategy record search and ranking", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search a collection of records
    Search(SearchArgs),
}

/// Output rendering for search results
#[derive(ValueEnum, JsonSchema, Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Ranked list with highlighted fields
    #[default]
    Markdown,
    /// The full search response as JSON
    Json,
}

/// Search tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug, Default)]
pub struct SearchArgs {
    /// Search text; also used verbatim as the wildcard and regex pattern
    #[arg(short = 'q', long)]
    #[schemars(description = "Search text; also used verbatim as the wildcard and regex pattern")]
    pub query: String,

    /// JSON file holding an array of records
    #[arg(short = 'r', long)]
    #[schemars(description = "JSON file holding an array of records")]
    pub records_file: Option<PathBuf>,

    /// Inline records (MCP only)
    #[arg(skip)]
    #[schemars(description = "Inline array of record objects; takes precedence over records_file")]
    pub records: Option<Vec<Value>>,

    /// Strategies to run: "all" or a comma separated list of fuzzy, semantic, location, wildcard, regex
    #[arg(short = 's', long)]
    #[schemars(description = "Strategies to run: \"all\" or a comma separated list of fuzzy, semantic, location, wildcard, regex")]
    pub strategies: Option<String>,

    /// Maximum number of results (default 50)
    #[arg(short = 'l', long)]
    #[schemars(description = "Maximum number of results (default 50)")]
    pub limit: Option<usize>,

    /// Minimum fuzzy similarity in [0, 1] (default 0.3)
    #[arg(short = 't', long)]
    #[schemars(description = "Minimum fuzzy similarity in [0, 1] (default 0.3)")]
    pub threshold: Option<f64>,

    /// Caller latitude for the proximity bonus
    #[arg(long, allow_hyphen_values = true, requires = "lng")]
    #[schemars(description = "Caller latitude for the proximity bonus (requires lng)")]
    pub lat: Option<f64>,

    /// Caller longitude for the proximity bonus
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    #[schemars(description = "Caller longitude for the proximity bonus (requires lat)")]
    pub lng: Option<f64>,

    /// Attribute filters as a JSON object, e.g. '{"state":"Karnataka","fees":{"max":50000}}'
    #[arg(short = 'f', long)]
    #[schemars(description = "Attribute filters as a JSON object string: value for equality, array for any-of, {min,max} for ranges")]
    pub filters: Option<String>,

    /// Skip highlight generation
    #[arg(long)]
    #[serde(default)]
    #[schemars(description = "Skip highlight generation")]
    pub no_highlights: bool,

    /// Output format
    #[arg(long, value_enum)]
    #[schemars(description = "Output format: markdown (default) or json")]
    pub format: Option<OutputFormat>,

    /// Configuration file (defaults to <config_dir>/polysearch/config.json)
    #[arg(short = 'c', long, env = "POLYSEARCH_CONFIG")]
    #[schemars(description = "Configuration file path")]
    pub config: Option<PathBuf>,
}
