//! Shared types for the price matcher

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Set of lemma strings; the comparable unit for queries and catalog entries.
pub type LemmaSet = BTreeSet<String>;

/// One row of the service price list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Category, inherited from the previous row when the source leaves it blank
    pub category: String,
    /// Service name, the primary text matched against
    pub name: String,
    /// Free-form price text, may be empty
    pub price: String,
    /// Free-form comment, not used for matching
    pub comment: String,
}

impl CatalogEntry {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        price: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            price: price.into(),
            comment: comment.into(),
        }
    }
}

/// Matcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Tokens shorter than this (in characters) are dropped as non-content words
    pub min_token_len: usize,
    /// An entry matches when its coverage ratio is strictly greater than this
    pub coverage_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_token_len: 3,
            coverage_threshold: 0.5,
        }
    }
}

/// Why an entry was or was not included for a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchExplanation {
    pub query_lemmas: LemmaSet,
    pub entry_lemmas: LemmaSet,
    pub matched: LemmaSet,
    pub ratio: f64,
    pub included: bool,
}

/// Errors raised while loading a morphological dictionary
#[derive(Error, Debug)]
pub enum MorphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dictionary syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Lexeme {id} has no word forms")]
    EmptyLexeme { id: u32 },

    #[error("Duplicate lexeme id {id}")]
    DuplicateLexeme { id: u32 },

    #[error("Lexeme {from} links to unknown lexeme {to}")]
    UnknownLink { from: u32, to: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matcher_config_defaults() {
        let config = MatcherConfig::default();
        assert_eq!(config.min_token_len, 3);
        assert_eq!(config.coverage_threshold, 0.5);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = CatalogEntry::new("Диагностика", "Диагностика двигателя", "2000", "");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["category"], "Диагностика");
        assert_eq!(json["name"], "Диагностика двигателя");

        let back: CatalogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_explanation_serializes_sets_sorted() {
        let explanation = MatchExplanation {
            query_lemmas: ["фильтр", "замена"].iter().map(|s| s.to_string()).collect(),
            entry_lemmas: LemmaSet::new(),
            matched: LemmaSet::new(),
            ratio: 0.0,
            included: false,
        };
        let json = serde_json::to_value(&explanation).unwrap();
        assert_eq!(json["query_lemmas"], serde_json::json!(["замена", "фильтр"]));
    }
}
