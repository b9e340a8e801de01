//! Query Parser & Normalizer
//!
//! Normalizes raw query text and field values into a canonical lowercase,
//! punctuation-free form and splits it into tokens.

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Stop words ignored when building term-weight vectors
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "or", "that", "the", "to", "was", "will", "with", "i", "you",
];

/// Parsed and normalized search query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// Original query with surrounding whitespace removed, used verbatim by
    /// the pattern strategies
    pub raw: String,
    /// Lowercased, punctuation-free, whitespace-collapsed query
    pub normalized: String,
    /// Tokens of the normalized query, in order
    pub tokens: Vec<String>,
}

impl Query {
    /// True when nothing searchable is left after normalization
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Query parser and normalizer
pub struct QueryParser;

impl QueryParser {
    /// Parse a raw query into its normalized form and tokens
    pub fn parse(query: &str) -> Query {
        let normalized = Self::normalize(query);
        let tokens = Self::split(&normalized);

        Query {
            raw: query.trim().to_string(),
            normalized,
            tokens,
        }
    }

    /// Normalize text: lowercase, trim, collapse whitespace, drop every
    /// character that is neither a word character nor whitespace, trim again.
    pub fn normalize(text: &str) -> String {
        let lowered: String = text.nfc().collect::<String>().to_lowercase();
        let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");

        let stripped: String = collapsed
            .chars()
            .filter(|c| Self::is_word_char(*c) || c.is_whitespace())
            .collect();

        // Stripping can leave doubled spaces ("a - b" -> "a  b")
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Normalize and split arbitrary text into tokens
    pub fn tokenize(text: &str) -> Vec<String> {
        Self::split(&Self::normalize(text))
    }

    /// Tokens suitable for term weighting: unicode words minus stop words
    pub fn terms(text: &str) -> Vec<String> {
        Self::normalize(text)
            .unicode_words()
            .filter(|w| !Self::is_stop_word(w))
            .map(str::to_string)
            .collect()
    }

    fn split(normalized: &str) -> Vec<String> {
        normalized.split_whitespace().map(str::to_string).collect()
    }

    fn is_word_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    /// Check if a word is a stop word
    fn is_stop_word(word: &str) -> bool {
        STOP_WORDS.contains(&word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_parsing() {
        let parsed = QueryParser::parse("Hello World");
        assert_eq!(parsed.raw, "Hello World");
        assert_eq!(parsed.normalized, "hello world");
        assert_eq!(parsed.tokens, vec!["hello", "world"]);
    }

    #[test]
    fn test_collapses_whitespace_and_strips_punctuation() {
        let parsed = QueryParser::parse("  St.  Xavier's   College,  Mumbai!  ");
        assert_eq!(parsed.normalized, "st xaviers college mumbai");
        assert_eq!(parsed.tokens.len(), 4);
    }

    #[test]
    fn test_punctuation_between_spaces() {
        assert_eq!(QueryParser::normalize("arts - science"), "arts science");
    }

    #[test]
    fn test_underscore_is_word_char() {
        assert_eq!(QueryParser::normalize("snake_case!"), "snake_case");
    }

    #[test]
    fn test_empty_query() {
        let parsed = QueryParser::parse("");
        assert_eq!(parsed.normalized, "");
        assert!(parsed.tokens.is_empty());
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_only_punctuation() {
        let parsed = QueryParser::parse("*?!");
        assert!(parsed.is_empty());
        assert_eq!(parsed.raw, "*?!");
    }

    #[test]
    fn test_unicode_words() {
        let parsed = QueryParser::parse("Café Résumé");
        assert_eq!(parsed.tokens, vec!["café", "résumé"]);
    }

    #[test]
    fn test_terms_drop_stop_words() {
        let terms = QueryParser::terms("Institute of Technology and Science");
        assert_eq!(terms, vec!["institute", "technology", "science"]);
    }
}
