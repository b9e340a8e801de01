//! Wildcard pattern strategy
//!
//! `*` matches any run of characters and `?` any single character; all
//! other characters are literal. Matching is case-insensitive and
//! unanchored.

use super::{hit_from_fields, MatchedField, StrategyHit, PATTERN_SIZE_LIMIT};
use crate::search::error::StrategyError;
use crate::search::options::SearchMethod;
use crate::search::parser::Query;
use crate::search::record::Record;
use regex::{Regex, RegexBuilder};

/// Translate a glob into a regular expression source string
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut literal = [0u8; 4];

    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }

    out
}

/// Number of wildcard and dot meta-characters in the glob
pub fn pattern_complexity(pattern: &str) -> usize {
    pattern.chars().filter(|c| matches!(c, '*' | '?' | '.')).count()
}

/// Compile a glob into a case-insensitive matcher
pub fn compile(pattern: &str) -> Result<Regex, StrategyError> {
    RegexBuilder::new(&glob_to_regex(pattern))
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| StrategyError::InvalidPattern {
            method: SearchMethod::Wildcard,
            message: e.to_string(),
        })
}

/// `min(1, match_len / 100 / (complexity + 1))`
pub fn match_score(match_len: usize, complexity: usize) -> f64 {
    ((match_len as f64 / 100.0) * (1.0 / (complexity as f64 + 1.0))).min(1.0)
}

/// Run the wildcard strategy over every record
pub fn search(query: &Query, records: &[Record]) -> Result<Vec<StrategyHit>, StrategyError> {
    if query.raw.is_empty() {
        return Ok(Vec::new());
    }

    let matcher = compile(&query.raw)?;
    let complexity = pattern_complexity(&query.raw);

    Ok(records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let fields = record
                .searchable_fields()
                .into_iter()
                .filter_map(|field| {
                    let found = matcher.find(field.value)?;
                    Some(MatchedField {
                        field: field.name.to_string(),
                        score: match_score(found.as_str().chars().count(), complexity),
                        value: field.value.to_string(),
                    })
                })
                .collect();

            hit_from_fields(index, SearchMethod::Wildcard, fields)
        })
        .collect())
}
