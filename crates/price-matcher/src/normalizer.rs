//! Morphological normalizer
//!
//! Turns free text into lemmas and expands lemmas with their derivational
//! noun/adjective partners, so "масляный фильтр" and "фильтр для масла"
//! normalize to overlapping sets.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::morph::{MorphAnalyzer, PartOfSpeech};
use crate::types::LemmaSet;

/// Maximal runs of Russian letters (input is lowercased first)
static CYRILLIC_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[а-яё]+").unwrap());

/// Default minimum token length; shorter tokens are prepositions, particles, etc.
pub const DEFAULT_MIN_TOKEN_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct Normalizer {
    analyzer: Arc<MorphAnalyzer>,
    min_token_len: usize,
}

impl Normalizer {
    pub fn new(analyzer: Arc<MorphAnalyzer>) -> Self {
        Self::with_min_token_len(analyzer, DEFAULT_MIN_TOKEN_LEN)
    }

    pub fn with_min_token_len(analyzer: Arc<MorphAnalyzer>, min_token_len: usize) -> Self {
        Self {
            analyzer,
            min_token_len,
        }
    }

    pub fn analyzer(&self) -> &MorphAnalyzer {
        &self.analyzer
    }

    /// Lowercased content words of `text`, in order of appearance.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        CYRILLIC_WORD
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|word| word.chars().count() >= self.min_token_len)
            .map(str::to_string)
            .collect()
    }

    /// Lemma of every content word, in order, duplicates kept.
    ///
    /// Words outside the dictionary come out as stem keys.
    pub fn lemmatize(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .iter()
            .filter_map(|word| self.analyzer.lemma(word))
            .collect()
    }

    /// Lemma set extended with linked nouns (for adjectives) and linked
    /// adjectives (for nouns).
    ///
    /// Lemmas are kept as given. Only a lemma that is a dictionary normal
    /// form is looked up for partners; stem keys stay alone.
    pub fn expand<S: AsRef<str>>(&self, lemmas: &[S]) -> LemmaSet {
        let mut expanded = LemmaSet::new();

        for lemma in lemmas {
            let lemma = lemma.as_ref().trim().to_lowercase();
            if lemma.is_empty() {
                continue;
            }

            if let Some(parse) = self.analyzer.dictionary_lemma(&lemma) {
                let partner = if parse.tag.is(PartOfSpeech::Adjf) {
                    Some(PartOfSpeech::Noun)
                } else if parse.tag.is(PartOfSpeech::Noun) {
                    Some(PartOfSpeech::Adjf)
                } else {
                    None
                };

                if let Some(partner) = partner {
                    expanded.extend(
                        self.analyzer
                            .paradigm(&parse)
                            .into_iter()
                            .filter(|form| form.tag.is(partner))
                            .map(|form| form.normal_form),
                    );
                }
            }
            expanded.insert(lemma);
        }

        expanded
    }

    /// `expand(lemmatize(text))`
    pub fn lemma_set(&self, text: &str) -> LemmaSet {
        self.expand(&self.lemmatize(text))
    }
}
