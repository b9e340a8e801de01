//! Multi-strategy record search
//!
//! A query is run through up to five retrieval strategies (fuzzy, semantic,
//! location, wildcard, regex). Their hits are fused into one result per
//! record, filtered, ranked and highlighted. See [`engine::search`].

pub mod engine;
pub mod error;
pub mod filter;
pub mod fusion;
pub mod highlight;
pub mod options;
pub mod parser;
pub mod ranking;
pub mod record;
pub mod similarity;
pub mod strategies;


pub use engine::{search, Diagnostics, SearchResponse, StrategyFailure};
pub use error::{SearchError, StrategyError};
pub use filter::{FilterValue, NumericRange};
pub use fusion::FusedResult;
pub use highlight::{HighlightFragment, Highlighter};
pub use options::{GeoPoint, SearchMethod, SearchOptions};
pub use parser::{Query, QueryParser};
pub use record::Record;
pub use strategies::{MatchedField, StrategyHit};
