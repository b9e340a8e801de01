//! Search Engine Integration
//!
//! Ties together normalization, the retrieval strategies, fusion,
//! filtering, ranking and highlighting into a single call:
//!
//! ```text
//! normalize -> {strategies, in parallel} -> fuse -> filter -> rank -> highlight
//! ```
//!
//! Nothing is kept between calls. A failing strategy is dropped from the
//! call and reported in the diagnostics; only structural failures turn the
//! response into `success: false`.

use crate::search::error::{SearchError, StrategyError};
use crate::search::filter::apply_filters;
use crate::search::fusion::{fuse, FusedResult};
use crate::search::highlight::Highlighter;
use crate::search::options::{SearchMethod, SearchOptions};
use crate::search::parser::{Query, QueryParser};
use crate::search::ranking::rank;
use crate::search::record::Record;
use crate::search::strategies::{run_strategy, StrategyHit};
use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, warn};

/// A strategy that was dropped from a call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyFailure {
    pub strategy: SearchMethod,
    pub message: String,
}

impl From<&StrategyError> for StrategyFailure {
    fn from(err: &StrategyError) -> Self {
        Self {
            strategy: err.method(),
            message: err.to_string(),
        }
    }
}

/// Per-call diagnostic metadata
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Raw hit count per strategy that completed
    pub strategy_hits: BTreeMap<SearchMethod, usize>,
    /// Strategies excluded from fusion, with the reason
    pub strategy_errors: Vec<StrategyFailure>,
    pub took_ms: u64,
}

/// Outcome of one search call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<'a> {
    pub success: bool,
    /// Score-descending, at most `max_results` long
    pub results: Vec<FusedResult<'a>>,
    pub total: usize,
    /// The normalized query
    pub query: String,
    pub strategies_used: Vec<SearchMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub diagnostics: Diagnostics,
}

impl<'a> SearchResponse<'a> {
    fn failure(query: String, strategies_used: Vec<SearchMethod>, error: &SearchError) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            total: 0,
            query,
            strategies_used,
            error: Some(error.to_string()),
            diagnostics: Diagnostics::default(),
        }
    }
}

/// Search `records` for `query`.
///
/// Never panics and never returns an error: failures are reported through
/// `success` / `error` on the response.
pub fn search<'a>(query: &str, records: &'a [Record], options: &SearchOptions) -> SearchResponse<'a> {
    let started = Instant::now();
    let parsed = QueryParser::parse(query);
    let strategies = options.resolved_strategies();

    if let Err(e) = options.validate() {
        warn!("Rejected search options: {}", e);
        return SearchResponse::failure(parsed.normalized, strategies, &e);
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_pipeline(&parsed, records, options, &strategies)
    }))
    .unwrap_or_else(|payload| Err(SearchError::Internal(panic_message(payload.as_ref()))));

    match outcome {
        Ok((results, mut diagnostics)) => {
            diagnostics.took_ms = started.elapsed().as_millis() as u64;
            debug!(
                "Search '{}' over {} records: {} results in {}ms",
                parsed.normalized,
                records.len(),
                results.len(),
                diagnostics.took_ms
            );
            SearchResponse {
                success: true,
                total: results.len(),
                results,
                query: parsed.normalized,
                strategies_used: strategies,
                error: None,
                diagnostics,
            }
        }
        Err(e) => {
            warn!("Search pipeline failed: {}", e);
            SearchResponse::failure(parsed.normalized, strategies, &e)
        }
    }
}

fn run_pipeline<'a>(
    query: &Query,
    records: &'a [Record],
    options: &SearchOptions,
    strategies: &[SearchMethod],
) -> Result<(Vec<FusedResult<'a>>, Diagnostics), SearchError> {
    let mut diagnostics = Diagnostics::default();

    if query.raw.is_empty() || records.is_empty() {
        return Ok((Vec::new(), diagnostics));
    }

    // Strategies share only immutable inputs; collect keeps canonical order
    let outcomes: Vec<(SearchMethod, Result<Vec<StrategyHit>, StrategyError>)> = strategies
        .par_iter()
        .map(|&method| (method, run_isolated(method, query, records, options)))
        .collect();

    let mut hits = Vec::new();
    for (method, outcome) in outcomes {
        match outcome {
            Ok(strategy_hits) => {
                diagnostics.strategy_hits.insert(method, strategy_hits.len());
                hits.extend(strategy_hits);
            }
            Err(e) => {
                warn!("Excluding {} strategy from this search: {}", method, e);
                diagnostics.strategy_errors.push(StrategyFailure::from(&e));
            }
        }
    }

    let fused = fuse(hits, records);
    if fused.len() > records.len() {
        return Err(SearchError::Internal(format!(
            "fusion produced {} results for {} records",
            fused.len(),
            records.len()
        )));
    }

    let filtered = apply_filters(fused, &options.filters);
    let mut ranked = rank(filtered, options.max_results);

    if options.include_highlights {
        let (open, close) = &options.highlight_marker;
        Highlighter::new(&query.tokens, open, close).annotate(&mut ranked);
    }

    Ok((ranked, diagnostics))
}

/// Run one strategy, turning a panic into a strategy error
fn run_isolated(
    method: SearchMethod,
    query: &Query,
    records: &[Record],
    options: &SearchOptions,
) -> Result<Vec<StrategyHit>, StrategyError> {
    let started = Instant::now();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_strategy(method, query, records, options)
    }))
    .unwrap_or_else(|payload| {
        Err(StrategyError::Panicked {
            method,
            message: panic_message(payload.as_ref()),
        })
    });

    debug!(
        "{} strategy finished in {:?} ({})",
        method,
        started.elapsed(),
        match &outcome {
            Ok(hits) => format!("{} hits", hits.len()),
            Err(e) => e.to_string(),
        }
    );

    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
