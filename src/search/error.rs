//! Error types for the search pipeline

use crate::search::options::SearchMethod;
use thiserror::Error;

/// Failures that abort a whole search call
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search options: {0}")]
    InvalidOptions(String),
    #[error("Search pipeline failed: {0}")]
    Internal(String),
}

/// Failures isolated to one strategy; the call still succeeds without it
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StrategyError {
    #[error("{method} pattern is invalid: {message}")]
    InvalidPattern {
        method: SearchMethod,
        message: String,
    },
    #[error("{method} strategy exceeded its {budget_ms}ms time budget")]
    Timeout { method: SearchMethod, budget_ms: u64 },
    #[error("{method} strategy panicked: {message}")]
    Panicked {
        method: SearchMethod,
        message: String,
    },
}

impl StrategyError {
    pub fn method(&self) -> SearchMethod {
        match self {
            StrategyError::InvalidPattern { method, .. }
            | StrategyError::Timeout { method, .. }
            | StrategyError::Panicked { method, .. } => *method,
        }
    }
}
