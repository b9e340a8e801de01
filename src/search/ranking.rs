//! Ranking
//!
//! Orders fused results by score and cuts the list to the result limit.

use crate::search::fusion::FusedResult;
use std::cmp::Ordering;

/// Compare two results for ranking: higher score first.
/// NaN scores sort last.
pub fn compare_results(a: &FusedResult<'_>, b: &FusedResult<'_>) -> Ordering {
    match (a.score.is_nan(), b.score.is_nan()) {
        (false, false) => b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}

/// Sort by score, descending, and truncate to `max_results`.
///
/// The sort is stable: equal scores keep fusion emission order.
pub fn rank<'a>(mut results: Vec<FusedResult<'a>>, max_results: usize) -> Vec<FusedResult<'a>> {
    results.sort_by(compare_results);
    results.truncate(max_results);
    results
}
