//! Statistical term-relevance strategy
//!
//! Builds a TF-IDF model over the searchable text of the records in this
//! call, with the query added as one more document, and keeps records whose
//! cosine similarity to the query exceeds a floor. The model lives only for
//! the duration of one call.

use super::{MatchedField, StrategyHit};
use crate::search::options::SearchMethod;
use crate::search::parser::{Query, QueryParser};
use crate::search::record::Record;
use crate::search::similarity::cosine_similarity;
use std::collections::{HashMap, HashSet};

/// Records at or below this similarity are dropped
pub const MIN_SIMILARITY: f64 = 0.1;

type TermCounts = HashMap<String, usize>;
type TermVector = HashMap<String, f64>;

/// TF-IDF model over one document collection
#[derive(Debug)]
pub struct TermModel {
    documents: Vec<TermCounts>,
    document_frequency: HashMap<String, usize>,
}

impl TermModel {
    /// Build a model from raw document texts
    pub fn build<'t>(texts: impl IntoIterator<Item = &'t str>) -> Self {
        let documents: Vec<TermCounts> = texts.into_iter().map(count_terms).collect();

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for doc in &documents {
            for term in doc.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        Self {
            documents,
            document_frequency,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Smoothed inverse document frequency: `1 + ln(N / (1 + df))`.
    /// Stays positive for every term in the collection.
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.document_frequency.get(term).copied().unwrap_or(0);
        1.0 + (self.documents.len() as f64 / (1 + df) as f64).ln()
    }

    /// Term-weight vector of document `index`
    pub fn vector(&self, index: usize) -> TermVector {
        self.documents
            .get(index)
            .map(|doc| {
                doc.iter()
                    .map(|(term, &tf)| (term.clone(), tf as f64 * self.idf(term)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn count_terms(text: &str) -> TermCounts {
    let mut counts = TermCounts::new();
    for term in QueryParser::terms(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

/// Run the semantic strategy over every record
pub fn search(query: &Query, records: &[Record]) -> Vec<StrategyHit> {
    if query.is_empty() || records.is_empty() {
        return Vec::new();
    }

    let texts: Vec<String> = records.iter().map(Record::searchable_text).collect();
    let model = TermModel::build(
        texts
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(query.normalized.as_str())),
    );

    let query_vector = model.vector(records.len());
    if query_vector.is_empty() {
        return Vec::new();
    }
    let query_terms: HashSet<&str> = query_vector.keys().map(String::as_str).collect();

    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let score = cosine_similarity(&query_vector, &model.vector(index));
            if score <= MIN_SIMILARITY {
                return None;
            }

            let matched_fields = record
                .searchable_fields()
                .into_iter()
                .filter(|field| {
                    QueryParser::terms(field.value)
                        .iter()
                        .any(|t| query_terms.contains(t.as_str()))
                })
                .map(|field| MatchedField {
                    field: field.name.to_string(),
                    score,
                    value: field.value.to_string(),
                })
                .collect();

            Some(StrategyHit {
                record_index: index,
                raw_score: score,
                matched_fields,
                method: SearchMethod::Semantic,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, course: &str) -> Record {
        Record {
            name: Some(name.to_string()),
            course: Some(course.to_string()),
            ..Record::default()
        }
    }

    #[test]
    fn test_idf_rewards_rare_terms() {
        let model = TermModel::build(["medical college", "dental college", "medical school"]);
        assert!(model.idf("dental") > model.idf("college"));
        assert!(model.idf("college") > 0.0);
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn test_vector_of_missing_document_is_empty() {
        let model = TermModel::build(["one"]);
        assert!(model.vector(5).is_empty());
    }

    #[test]
    fn test_search_ranks_relevant_record() {
        let records = vec![
            record("Arjun Institute", "Computer Science Engineering"),
            record("Beta University", "Dental Surgery"),
            record("Gamma College", "Mechanical Engineering"),
        ];

        let hits = search(&QueryParser::parse("computer science"), &records);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record_index, 0);
        assert!(hits[0].raw_score > MIN_SIMILARITY && hits[0].raw_score <= 1.0);
        assert_eq!(hits[0].matched_fields.len(), 1);
        assert_eq!(hits[0].matched_fields[0].field, "course");
    }

    #[test]
    fn test_identical_text_scores_one() {
        let records = vec![Record::named("dental surgery")];
        let hits = search(&QueryParser::parse("dental surgery"), &records);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].raw_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_word_query_matches_nothing() {
        let records = vec![Record::named("The Institute of Arts")];
        assert!(search(&QueryParser::parse("the of"), &records).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(search(&QueryParser::parse(""), &[Record::named("x")]).is_empty());
        assert!(search(&QueryParser::parse("x"), &[]).is_empty());
    }
}
