//! Match highlighting
//!
//! Wraps every case-insensitive occurrence of each query token in a field's
//! displayed text with a marker. Tokens are applied one pass at a time in
//! query order; passes are independent, so overlapping tokens may nest.

use crate::search::fusion::FusedResult;
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A highlighted rendition of one matched field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightFragment {
    pub field: String,
    pub text: String,
}

/// Highlighter compiled once per search call
pub struct Highlighter {
    patterns: Vec<Regex>,
    open: String,
    close: String,
}

impl Highlighter {
    /// Compile one literal, case-insensitive pattern per token
    pub fn new(tokens: &[String], open: &str, close: &str) -> Self {
        let patterns = tokens
            .iter()
            .filter(|t| !t.is_empty())
            .filter_map(|token| {
                RegexBuilder::new(&regex::escape(token))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| debug!("Skipping highlight for token '{}': {}", token, e))
                    .ok()
            })
            .collect();

        Self {
            patterns,
            open: open.to_string(),
            close: close.to_string(),
        }
    }

    /// Highlight a single piece of text
    pub fn highlight(&self, text: &str) -> String {
        let mut out = text.to_string();
        for pattern in &self.patterns {
            out = pattern
                .replace_all(&out, |caps: &Captures| {
                    format!("{}{}{}", self.open, &caps[0], self.close)
                })
                .into_owned();
        }
        out
    }

    /// Fill in highlight fragments for every matched field of every result
    pub fn annotate(&self, results: &mut [FusedResult<'_>]) {
        for result in results.iter_mut() {
            result.highlights = result
                .matched_fields
                .iter()
                .map(|field| HighlightFragment {
                    field: field.field.clone(),
                    text: self.highlight(&field.value),
                })
                .collect();
        }
    }
}
