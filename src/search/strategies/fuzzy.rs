//! Fuzzy matching strategy
//!
//! Scores each field by the best edit-distance similarity between any query
//! token and any field token. Name fields additionally earn a fixed bonus
//! when the whole query sounds like the whole name.

use super::{hit_from_fields, MatchedField, StrategyHit};
use crate::search::options::{SearchMethod, SearchOptions};
use crate::search::parser::{Query, QueryParser};
use crate::search::record::{FieldKind, Record};
use crate::search::similarity::{similarity, sounds_alike};

/// Score granted when query and name share a phonetic encoding
pub const PHONETIC_BONUS: f64 = 0.8;

/// Run the fuzzy strategy over every record
pub fn search(query: &Query, records: &[Record], options: &SearchOptions) -> Vec<StrategyHit> {
    if query.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let fields = record
                .searchable_fields()
                .into_iter()
                .map(|field| {
                    let mut score = best_token_similarity(
                        &query.tokens,
                        &QueryParser::tokenize(field.value),
                        options.fuzzy_threshold,
                    );
                    if field.kind == FieldKind::Name && sounds_alike(&query.normalized, field.value)
                    {
                        score = score.max(PHONETIC_BONUS);
                    }
                    MatchedField {
                        field: field.name.to_string(),
                        score,
                        value: field.value.to_string(),
                    }
                })
                .collect();

            hit_from_fields(index, SearchMethod::Fuzzy, fields)
        })
        .collect()
}

/// Best pairwise similarity that meets `threshold`, or 0
pub fn best_token_similarity(query_tokens: &[String], field_tokens: &[String], threshold: f64) -> f64 {
    let mut best = 0.0_f64;

    for q in query_tokens {
        for f in field_tokens {
            // Empty tokens have no defined ratio
            let Some(score) = similarity(q, f) else {
                continue;
            };
            if score >= threshold && score > best {
                best = score;
            }
        }
    }

    best
}
