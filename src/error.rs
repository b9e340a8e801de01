//! Error types and input validation for the CLI and MCP tool layer

use serde::Serialize;
use thiserror::Error;

/// Longest query the tool layer accepts, in characters
pub const MAX_QUERY_CHARS: usize = 500;

/// Application error types
#[derive(Debug, Error, Serialize)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Failed to load records: {0}")]
    RecordsLoadFailed(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the error code for MCP responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::RecordsLoadFailed(_) => "records_load_failed",
            AppError::ConfigError(_) => "config_error",
            AppError::Timeout(_) => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Convert anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

/// Records files are the only JSON the tool layer parses
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::RecordsLoadFailed(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::RecordsLoadFailed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Search task failed: {}", err))
    }
}

/// Reject queries the tool layer will not run. Empty queries are allowed
/// and produce an empty result list.
pub fn validate_query(query: &str) -> Result<(), AppError> {
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Query too long, maximum {} characters",
            MAX_QUERY_CHARS
        )));
    }

    Ok(())
}
