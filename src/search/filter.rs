//! Post-fusion attribute filters
//!
//! Every configured key is a constraint on one record attribute; all
//! constraints must hold (AND).

use crate::search::fusion::FusedResult;
use crate::search::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Inclusive numeric bounds; a missing bound is unconstrained
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// One filter constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Attribute must equal one of the listed values
    AnyOf(Vec<Value>),
    /// Numeric attribute must fall within the bounds
    Range(NumericRange),
    /// Attribute must equal the value; `null` disables the constraint
    Exact(Value),
}

impl FilterValue {
    /// Does `attribute` satisfy this constraint?
    pub fn accepts(&self, attribute: Option<&Value>) -> bool {
        match self {
            FilterValue::Exact(Value::Null) => true,
            FilterValue::Exact(expected) => attribute.is_some_and(|a| values_equal(a, expected)),
            FilterValue::AnyOf(allowed) => {
                attribute.is_some_and(|a| allowed.iter().any(|v| values_equal(a, v)))
            }
            FilterValue::Range(range) => match attribute.and_then(as_number) {
                Some(n) => {
                    range.min.map_or(true, |min| n >= min) && range.max.map_or(true, |max| n <= max)
                }
                None => false,
            },
        }
    }
}

/// Does the record pass every filter?
pub fn matches_filters(record: &Record, filters: &BTreeMap<String, FilterValue>) -> bool {
    filters
        .iter()
        .all(|(key, filter)| filter.accepts(record.attribute(key).as_ref()))
}

/// Keep only results whose record passes every filter
pub fn apply_filters<'a>(
    results: Vec<FusedResult<'a>>,
    filters: &BTreeMap<String, FilterValue>,
) -> Vec<FusedResult<'a>> {
    if filters.is_empty() {
        return results;
    }
    results
        .into_iter()
        .filter(|r| matches_filters(r.record, filters))
        .collect()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
