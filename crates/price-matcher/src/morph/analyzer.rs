//! Morphological analyzer
//!
//! Maps a surface word to ranked analyses. Three sources are tried in order:
//!
//! 1. Dictionary lookup of the exact form (`ё` and `е` are interchangeable)
//! 2. Known-suffix prediction from endings of productive dictionary forms
//! 3. Snowball stem of the word, tagged `UNKN`
//!
//! For matching, [`MorphAnalyzer::lemma`] reduces every word outside the
//! dictionary to a stem key. Predicted normal forms depend on which ending
//! the word happens to carry, the stem key does not: "ремень", "ремня" and
//! "ремнём" all give `ремн`.
//!
//! The analyzer is immutable after construction and can be shared via `Arc`.

use std::collections::HashMap;

use rust_stemmers::{Algorithm, Stemmer};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

use super::dictionary::Dictionary;
use super::tag::Tag;
use crate::types::MorphError;

/// Suffix lengths tried by the predictor, longest first
const MAX_SUFFIX_LEN: usize = 5;
const MIN_SUFFIX_LEN: usize = 3;

const VOWELS: &str = "аеиоуыэюяё";

/// How a parse was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMethod {
    Dictionary,
    KnownSuffix,
    Stem,
}

/// Position of a form inside the dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FormRef {
    lexeme: usize,
    form: usize,
}

/// One analysis of a word
#[derive(Debug, Clone, PartialEq)]
pub struct Parse {
    pub word: String,
    pub normal_form: String,
    pub tag: Tag,
    pub score: f32,
    pub method: ParseMethod,
    source: Option<FormRef>,
}

/// Ending rule learned from a dictionary form
#[derive(Debug, Clone)]
struct SuffixRule {
    form_ending: String,
    normal_ending: String,
    tag: Tag,
    count: u32,
}

pub struct MorphAnalyzer {
    dictionary: Dictionary,
    forms: HashMap<String, SmallVec<[FormRef; 2]>>,
    suffixes: HashMap<String, Vec<SuffixRule>>,
    stemmer: Stemmer,
}

impl MorphAnalyzer {
    /// Analyzer over the bundled dictionary
    pub fn bundled() -> Result<Self, MorphError> {
        Ok(Self::new(Dictionary::bundled()?))
    }

    pub fn new(dictionary: Dictionary) -> Self {
        let mut forms: HashMap<String, SmallVec<[FormRef; 2]>> = HashMap::new();
        let mut suffixes: HashMap<String, Vec<SuffixRule>> = HashMap::new();

        for (lexeme_idx, lexeme) in dictionary.lexemes().iter().enumerate() {
            let normal: Vec<char> = lexeme.normal_form().chars().collect();

            for (form_idx, form) in lexeme.forms.iter().enumerate() {
                forms.entry(fold_yo(&form.word)).or_default().push(FormRef {
                    lexeme: lexeme_idx,
                    form: form_idx,
                });

                if form.tag.pos().is_some_and(|pos| pos.is_productive()) {
                    learn_endings(&mut suffixes, &form.word, &normal, &form.tag);
                }
            }
        }

        debug!(
            "MorphAnalyzer ready: {} forms, {} suffix keys",
            forms.len(),
            suffixes.len()
        );

        Self {
            dictionary,
            forms,
            suffixes,
            stemmer: Stemmer::create(Algorithm::Russian),
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// All analyses of `word`, most probable first. Never empty for a
    /// non-empty word.
    pub fn parse(&self, word: &str) -> Vec<Parse> {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return Vec::new();
        }

        if let Some(refs) = self.forms.get(&fold_yo(&word)) {
            let score = 1.0 / refs.len() as f32;
            return refs
                .iter()
                .map(|&r| self.dictionary_parse(&word, r, score))
                .collect();
        }

        let predicted = self.predict(&word);
        if !predicted.is_empty() {
            return predicted;
        }

        vec![Parse {
            normal_form: self.stem_key(&word),
            word,
            tag: Tag::unknown(),
            score: 1.0,
            method: ParseMethod::Stem,
            source: None,
        }]
    }

    /// Most probable analysis of `word`
    pub fn best(&self, word: &str) -> Option<Parse> {
        self.parse(word).into_iter().next()
    }

    /// Matching lemma of `word`: the dictionary normal form for known words,
    /// the stem key for everything else.
    pub fn lemma(&self, word: &str) -> Option<String> {
        let parse = self.best(word)?;
        Some(match parse.method {
            ParseMethod::Dictionary => parse.normal_form,
            ParseMethod::KnownSuffix | ParseMethod::Stem => self.stem_key(&parse.word),
        })
    }

    /// Stem shared by the inflections of a word the dictionary lacks.
    ///
    /// Snowball stem, then a trailing `ов`/`ев` the stemmer only strips from
    /// some forms, then a fleeting `е`/`о` between the last two consonants.
    pub fn stem_key(&self, word: &str) -> String {
        let stem = self.stemmer.stem(&fold_yo(&word.to_lowercase())).into_owned();
        drop_fleeting_vowel(strip_ov_suffix(&stem))
    }

    /// Dictionary analysis whose normal form is exactly `lemma`
    pub fn dictionary_lemma(&self, lemma: &str) -> Option<Parse> {
        let refs = self.forms.get(&fold_yo(lemma))?;
        refs.iter()
            .map(|&r| self.dictionary_parse(lemma, r, 1.0))
            .find(|parse| parse.normal_form == lemma)
    }

    /// Every form of the parse's lexeme and of the lexemes linked to it.
    ///
    /// Guessed parses have no lexeme; their paradigm is the parse itself.
    pub fn paradigm(&self, parse: &Parse) -> Vec<Parse> {
        let Some(source) = parse.source else {
            return vec![parse.clone()];
        };

        let lexeme = &self.dictionary.lexemes()[source.lexeme];
        let mut family = vec![source.lexeme];
        family.extend(
            lexeme
                .links
                .iter()
                .filter_map(|&id| self.dictionary.position(id)),
        );

        family
            .into_iter()
            .flat_map(|lexeme_idx| {
                let lexeme = &self.dictionary.lexemes()[lexeme_idx];
                (0..lexeme.forms.len()).map(move |form_idx| FormRef {
                    lexeme: lexeme_idx,
                    form: form_idx,
                })
            })
            .map(|r| {
                let word = self.dictionary.lexemes()[r.lexeme].forms[r.form].word.clone();
                self.dictionary_parse(&word, r, 1.0)
            })
            .collect()
    }

    fn dictionary_parse(&self, word: &str, r: FormRef, score: f32) -> Parse {
        let lexeme = &self.dictionary.lexemes()[r.lexeme];
        Parse {
            word: word.to_string(),
            normal_form: lexeme.normal_form().to_string(),
            tag: lexeme.forms[r.form].tag.clone(),
            score,
            method: ParseMethod::Dictionary,
            source: Some(r),
        }
    }

    /// Guess analyses from the longest known ending of `word`.
    fn predict(&self, word: &str) -> Vec<Parse> {
        let chars: Vec<char> = word.chars().collect();

        for len in (MIN_SUFFIX_LEN..=MAX_SUFFIX_LEN).rev() {
            if chars.len() <= len {
                continue;
            }
            let key = fold_yo(&chars[chars.len() - len..].iter().collect::<String>());
            let Some(rules) = self.suffixes.get(&key) else {
                continue;
            };

            let total: u32 = rules.iter().map(|r| r.count).sum();
            let mut ranked: Vec<&SuffixRule> = rules.iter().collect();
            // stable: equal counts keep first-seen order
            ranked.sort_by(|a, b| b.count.cmp(&a.count));

            return ranked
                .into_iter()
                .map(|rule| {
                    let stem_len = chars.len() - rule.form_ending.chars().count();
                    let mut normal_form: String = chars[..stem_len].iter().collect();
                    normal_form.push_str(&rule.normal_ending);
                    Parse {
                        word: word.to_string(),
                        normal_form,
                        tag: rule.tag.clone(),
                        score: rule.count as f32 / total as f32,
                        method: ParseMethod::KnownSuffix,
                        source: None,
                    }
                })
                .collect();
        }

        Vec::new()
    }
}

impl std::fmt::Debug for MorphAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MorphAnalyzer")
            .field("lexemes", &self.dictionary.len())
            .field("forms", &self.forms.len())
            .field("suffix_keys", &self.suffixes.len())
            .finish_non_exhaustive()
    }
}

/// Record the ending rules a single form teaches the predictor.
fn learn_endings(
    suffixes: &mut HashMap<String, Vec<SuffixRule>>,
    word: &str,
    normal: &[char],
    tag: &Tag,
) {
    let chars: Vec<char> = word.chars().collect();
    let common = chars
        .iter()
        .zip(normal)
        .take_while(|(a, b)| a == b)
        .count();
    let form_ending: String = chars[common..].iter().collect();
    let normal_ending: String = normal[common..].iter().collect();
    let ending_len = chars.len() - common;

    for len in MIN_SUFFIX_LEN..=MAX_SUFFIX_LEN {
        if chars.len() <= len || ending_len > len {
            continue;
        }
        let key = fold_yo(&chars[chars.len() - len..].iter().collect::<String>());
        let rules = suffixes.entry(key).or_default();
        match rules.iter_mut().find(|r| {
            r.form_ending == form_ending && r.normal_ending == normal_ending && r.tag == *tag
        }) {
            Some(rule) => rule.count += 1,
            None => rules.push(SuffixRule {
                form_ending: form_ending.clone(),
                normal_ending: normal_ending.clone(),
                tag: tag.clone(),
                count: 1,
            }),
        }
    }
}

/// Lookup key: `ё` folded to `е`
fn fold_yo(word: &str) -> String {
    word.replace('ё', "е")
}

fn is_vowel(c: char) -> bool {
    VOWELS.contains(c)
}

fn is_consonant(c: char) -> bool {
    ('а'..='я').contains(&c) && !is_vowel(c) && !matches!(c, 'й' | 'ь' | 'ъ')
}

/// "кузов" stems to `куз` but "кузова" to `кузов`
fn strip_ov_suffix(stem: &str) -> &str {
    match stem.strip_suffix("ов").or_else(|| stem.strip_suffix("ев")) {
        Some(rest) if rest.chars().any(is_vowel) => rest,
        _ => stem,
    }
}

/// "ремен" -> `ремн`, "стекол" -> `стекл`
fn drop_fleeting_vowel(stem: &str) -> String {
    let mut chars: Vec<char> = stem.chars().collect();
    if let [.., before, vowel, last] = chars[..] {
        if is_consonant(before) && matches!(vowel, 'е' | 'о') && is_consonant(last) {
            let idx = chars.len() - 2;
            chars.remove(idx);
        }
    }
    chars.into_iter().collect()
}
