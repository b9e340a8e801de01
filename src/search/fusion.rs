//! Result fusion
//!
//! Merges the hits of independent strategies into one result per record.
//! The fused score is the best weighted score, not a sum, so two weak
//! strategies never outrank one strong one.

use crate::search::highlight::HighlightFragment;
use crate::search::options::SearchMethod;
use crate::search::record::Record;
use crate::search::strategies::{MatchedField, StrategyHit};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// One record after fusion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedResult<'a> {
    pub record_index: usize,
    pub record: &'a Record,
    /// Max of `raw_score * weight` over all strategies that hit the record
    pub score: f64,
    pub methods: BTreeSet<SearchMethod>,
    /// Concatenation of every strategy's matched fields; the same field may
    /// appear once per strategy that matched it
    pub matched_fields: Vec<MatchedField>,
    pub highlights: Vec<HighlightFragment>,
}

/// Fuse hits keyed on record index.
///
/// Results are emitted in order of first appearance, which is strategy
/// order then record order. Hits pointing outside `records` are dropped.
pub fn fuse<'a>(hits: Vec<StrategyHit>, records: &'a [Record]) -> Vec<FusedResult<'a>> {
    let mut fused: Vec<FusedResult<'a>> = Vec::new();
    let mut positions: HashMap<usize, usize> = HashMap::new();

    for hit in hits {
        let Some(record) = records.get(hit.record_index) else {
            continue;
        };
        let weighted = hit.weighted_score();

        match positions.get(&hit.record_index) {
            Some(&pos) => {
                let existing = &mut fused[pos];
                existing.score = existing.score.max(weighted);
                existing.methods.insert(hit.method);
                existing.matched_fields.extend(hit.matched_fields);
            }
            None => {
                positions.insert(hit.record_index, fused.len());
                fused.push(FusedResult {
                    record_index: hit.record_index,
                    record,
                    score: weighted,
                    methods: BTreeSet::from([hit.method]),
                    matched_fields: hit.matched_fields,
                    highlights: Vec::new(),
                });
            }
        }
    }

    fused
}
