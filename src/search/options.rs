//! Search options
//!
//! One explicit configuration struct with documented defaults, validated
//! once when a search call starts and never mutated afterwards.

use crate::search::filter::FilterValue;
use crate::search::SearchError;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default result limit
pub const DEFAULT_MAX_RESULTS: usize = 50;
/// Default minimum token similarity for the fuzzy strategy
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.3;
/// Default time budget for the regex strategy, per call
pub const DEFAULT_REGEX_TIMEOUT_MS: u64 = 250;

/// Retrieval strategies, in canonical execution and fusion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Fuzzy,
    Semantic,
    Location,
    Wildcard,
    Regex,
}

impl SearchMethod {
    /// Every strategy, in canonical order
    pub const ALL: [SearchMethod; 5] = [
        SearchMethod::Fuzzy,
        SearchMethod::Semantic,
        SearchMethod::Location,
        SearchMethod::Wildcard,
        SearchMethod::Regex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::Fuzzy => "fuzzy",
            SearchMethod::Semantic => "semantic",
            SearchMethod::Location => "location",
            SearchMethod::Wildcard => "wildcard",
            SearchMethod::Regex => "regex",
        }
    }

    /// Cross-strategy scale applied to the raw [0,1] score
    pub fn weight(&self) -> f64 {
        match self {
            SearchMethod::Fuzzy => 100.0,
            SearchMethod::Semantic => 70.0,
            SearchMethod::Location => 60.0,
            SearchMethod::Wildcard => 50.0,
            SearchMethod::Regex => 40.0,
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMethod {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fuzzy" => Ok(SearchMethod::Fuzzy),
            "semantic" => Ok(SearchMethod::Semantic),
            "location" => Ok(SearchMethod::Location),
            "wildcard" => Ok(SearchMethod::Wildcard),
            "regex" => Ok(SearchMethod::Regex),
            other => Err(SearchError::InvalidOptions(format!(
                "unknown strategy '{other}'"
            ))),
        }
    }
}

/// A user location in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Options for a single search call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Strategies to run; `"all"` or a list of names
    #[serde(deserialize_with = "deserialize_strategies")]
    pub strategies: Vec<SearchMethod>,
    pub max_results: usize,
    pub fuzzy_threshold: f64,
    pub location: Option<GeoPoint>,
    pub filters: BTreeMap<String, FilterValue>,
    pub include_highlights: bool,
    /// Time budget for the regex strategy across the whole collection
    pub regex_timeout_ms: u64,
    /// Opening and closing highlight marker
    pub highlight_marker: (String, String),
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            strategies: SearchMethod::ALL.to_vec(),
            max_results: DEFAULT_MAX_RESULTS,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            location: None,
            filters: BTreeMap::new(),
            include_highlights: true,
            regex_timeout_ms: DEFAULT_REGEX_TIMEOUT_MS,
            highlight_marker: ("<mark>".to_string(), "</mark>".to_string()),
        }
    }
}

impl SearchOptions {
    /// Options running only the given strategies
    pub fn with_strategies(strategies: &[SearchMethod]) -> Self {
        Self {
            strategies: strategies.to_vec(),
            ..Self::default()
        }
    }

    /// Check ranges once at call entry
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::InvalidOptions(
                "maxResults must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(SearchError::InvalidOptions(format!(
                "fuzzyThreshold must be within [0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if let Some(point) = &self.location {
            if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lng) {
                return Err(SearchError::InvalidOptions(format!(
                    "location ({}, {}) is out of range",
                    point.lat, point.lng
                )));
            }
        }
        if self.regex_timeout_ms == 0 {
            return Err(SearchError::InvalidOptions(
                "regexTimeoutMs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Requested strategies, deduplicated, in canonical order
    pub fn resolved_strategies(&self) -> Vec<SearchMethod> {
        let mut methods = self.strategies.clone();
        methods.sort();
        methods.dedup();
        methods
    }
}

/// Parse a comma separated strategy list; `all` selects every strategy
pub fn parse_strategies(selection: &str) -> Result<Vec<SearchMethod>, SearchError> {
    if selection.trim().eq_ignore_ascii_case("all") {
        return Ok(SearchMethod::ALL.to_vec());
    }
    selection.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(SearchMethod::from_str)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StrategySelection {
    Named(String),
    List(Vec<SearchMethod>),
}

fn deserialize_strategies<'de, D>(deserializer: D) -> Result<Vec<SearchMethod>, D::Error>
where
    D: Deserializer<'de>,
{
    match StrategySelection::deserialize(deserializer)? {
        StrategySelection::Named(name) => {
            parse_strategies(&name).map_err(serde::de::Error::custom)
        }
        StrategySelection::List(list) => Ok(list),
    }
}
