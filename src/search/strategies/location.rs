//! Location-aware strategy
//!
//! Text relevance against location and descriptive fields, boosted by
//! proximity to the caller's position when both sides have coordinates.
//!
//! A record scores `max(text score) + proximity bonus`, but only records with
//! a non-zero text score are hits. A record 2 km from the caller with no
//! matching text is dropped rather than returned on its 0.3 bonus alone.

use super::{MatchedField, StrategyHit};
use crate::search::options::{SearchMethod, SearchOptions};
use crate::search::parser::{Query, QueryParser};
use crate::search::record::{FieldKind, Record, SearchableField};
use crate::search::similarity::haversine_km;

/// Proximity tiers as (exclusive distance limit in km, bonus)
const PROXIMITY_TIERS: [(f64, f64); 3] = [(10.0, 0.3), (50.0, 0.2), (100.0, 0.1)];

/// Bonus for a record `distance_km` away; non-increasing with distance
pub fn proximity_bonus(distance_km: f64) -> f64 {
    PROXIMITY_TIERS
        .iter()
        .find(|(limit, _)| distance_km < *limit)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0)
}

/// Fraction of query tokens found in the field. Location fields match by
/// substring, other fields by whole token.
pub fn text_score(tokens: &[String], field: &SearchableField<'_>) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }

    let found = match field.kind {
        FieldKind::Location => {
            let value = field.value.to_lowercase();
            tokens.iter().filter(|t| value.contains(t.as_str())).count()
        }
        _ => {
            let field_tokens = QueryParser::tokenize(field.value);
            tokens.iter().filter(|t| field_tokens.contains(*t)).count()
        }
    };

    found as f64 / tokens.len() as f64
}

/// Run the location strategy over every record.
///
/// A record needs some text relevance to be a hit; proximity only boosts it.
/// The combined score may exceed 1.
pub fn search(query: &Query, records: &[Record], options: &SearchOptions) -> Vec<StrategyHit> {
    if query.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let matched_fields: Vec<MatchedField> = record
                .searchable_fields()
                .iter()
                .map(|field| MatchedField {
                    field: field.name.to_string(),
                    score: text_score(&query.tokens, field),
                    value: field.value.to_string(),
                })
                .filter(|f| f.score > 0.0)
                .collect();

            let text = matched_fields.iter().map(|f| f.score).fold(0.0_f64, f64::max);
            if text <= 0.0 {
                return None;
            }

            let bonus = match (options.location, record.coordinates()) {
                (Some(user), Some(place)) => proximity_bonus(haversine_km(user.as_tuple(), place)),
                _ => 0.0,
            };

            Some(StrategyHit {
                record_index: index,
                raw_score: text + bonus,
                matched_fields,
                method: SearchMethod::Location,
            })
        })
        .collect()
}
