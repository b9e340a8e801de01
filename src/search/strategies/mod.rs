//! Retrieval strategies
//!
//! Each strategy reads the same immutable inputs (normalized query, record
//! collection, options) and returns per-record hits with a raw score that is
//! scaled by the strategy's weight during fusion.

pub mod fuzzy;
pub mod location;
pub mod regexp;
pub mod semantic;
pub mod wildcard;

use crate::search::error::StrategyError;
use crate::search::options::{SearchMethod, SearchOptions};
use crate::search::parser::Query;
use crate::search::record::Record;
use serde::{Deserialize, Serialize};

/// Pattern compilation limits for user supplied expressions
pub(crate) const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A field that contributed to a hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedField {
    pub field: String,
    pub score: f64,
    pub value: String,
}

/// One strategy's verdict on one record
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyHit {
    pub record_index: usize,
    /// Unweighted score, in [0,1] except for the location proximity bonus
    pub raw_score: f64,
    pub matched_fields: Vec<MatchedField>,
    pub method: SearchMethod,
}

impl StrategyHit {
    /// Score on the cross-strategy scale
    pub fn weighted_score(&self) -> f64 {
        self.raw_score * self.method.weight()
    }
}

/// Run one strategy over the whole collection
pub fn run_strategy(
    method: SearchMethod,
    query: &Query,
    records: &[Record],
    options: &SearchOptions,
) -> Result<Vec<StrategyHit>, StrategyError> {
    match method {
        SearchMethod::Fuzzy => Ok(fuzzy::search(query, records, options)),
        SearchMethod::Semantic => Ok(semantic::search(query, records)),
        SearchMethod::Location => Ok(location::search(query, records, options)),
        SearchMethod::Wildcard => wildcard::search(query, records),
        SearchMethod::Regex => regexp::search(query, records, options),
    }
}

/// Build a hit from per-field scores, keeping fields that scored above zero.
/// The record's score is the best field score.
pub(crate) fn hit_from_fields(
    record_index: usize,
    method: SearchMethod,
    fields: Vec<MatchedField>,
) -> Option<StrategyHit> {
    let matched: Vec<MatchedField> = fields.into_iter().filter(|f| f.score > 0.0).collect();
    let best = matched.iter().map(|f| f.score).fold(0.0_f64, f64::max);

    if matched.is_empty() {
        return None;
    }
    Some(StrategyHit {
        record_index,
        raw_score: best,
        matched_fields: matched,
        method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, score: f64) -> MatchedField {
        MatchedField {
            field: name.to_string(),
            score,
            value: String::new(),
        }
    }

    #[test]
    fn test_hit_from_fields_keeps_positive_scores() {
        let hit = hit_from_fields(
            3,
            SearchMethod::Fuzzy,
            vec![field("name", 0.8), field("city", 0.0), field("course", 0.4)],
        )
        .unwrap();

        assert_eq!(hit.record_index, 3);
        assert_eq!(hit.raw_score, 0.8);
        assert_eq!(hit.matched_fields.len(), 2);
        assert!((hit.weighted_score() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_from_fields_none_when_nothing_matched() {
        assert!(hit_from_fields(0, SearchMethod::Regex, vec![field("name", 0.0)]).is_none());
        assert!(hit_from_fields(0, SearchMethod::Regex, vec![]).is_none());
    }
}
