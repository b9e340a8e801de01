//! Regular-expression strategy
//!
//! The raw query is compiled as a case-insensitive regular expression. The
//! regex engine matches in linear time, so a hostile pattern cannot
//! backtrack catastrophically; compiled size is capped and the whole pass
//! runs against a wall-clock budget checked between records.

use super::{hit_from_fields, MatchedField, StrategyHit, PATTERN_SIZE_LIMIT};
use crate::search::error::StrategyError;
use crate::search::options::{SearchMethod, SearchOptions};
use crate::search::parser::Query;
use crate::search::record::Record;
use regex::{Regex, RegexBuilder};
use std::time::{Duration, Instant};
use tracing::debug;

/// Matches needed for a full score
const SATURATION_MATCHES: f64 = 10.0;

/// Compile a user pattern
pub fn compile(pattern: &str) -> Result<Regex, StrategyError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .dfa_size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| StrategyError::InvalidPattern {
            method: SearchMethod::Regex,
            message: e.to_string(),
        })
}

/// Count non-overlapping, non-empty matches
pub fn count_matches(pattern: &Regex, text: &str) -> usize {
    pattern.find_iter(text).filter(|m| !m.as_str().is_empty()).count()
}

/// `min(1, match_count / 10)`
pub fn match_score(match_count: usize) -> f64 {
    (match_count as f64 / SATURATION_MATCHES).min(1.0)
}

/// Run the regex strategy over every record
pub fn search(
    query: &Query,
    records: &[Record],
    options: &SearchOptions,
) -> Result<Vec<StrategyHit>, StrategyError> {
    if query.raw.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = compile(&query.raw)?;
    let budget = Duration::from_millis(options.regex_timeout_ms);
    let started = Instant::now();
    let mut hits = Vec::new();

    for (index, record) in records.iter().enumerate() {
        if started.elapsed() > budget {
            debug!("Regex pass stopped at record {} of {}", index, records.len());
            return Err(StrategyError::Timeout {
                method: SearchMethod::Regex,
                budget_ms: options.regex_timeout_ms,
            });
        }

        let fields = record
            .searchable_fields()
            .into_iter()
            .map(|field| MatchedField {
                field: field.name.to_string(),
                score: match_score(count_matches(&pattern, field.value)),
                value: field.value.to_string(),
            })
            .collect();

        if let Some(hit) = hit_from_fields(index, SearchMethod::Regex, fields) {
            hits.push(hit);
        }
    }

    Ok(hits)
}
