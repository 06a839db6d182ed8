//! Word-form dictionary in OpenCorpora plain-text layout
//!
//! ```text
//! # comment
//! 11
//! масло	NOUN,inan,neut sing,nomn
//! масла	NOUN,inan,neut sing,gent
//!
//! 12	11
//! масляный	ADJF,Qual masc,sing,nomn
//! ```
//!
//! A lexeme is a header line holding its numeric id, followed by one
//! `FORM<TAB>TAG` line per word form. The first form is the normal form.
//! An optional TAB after the id lists linked lexeme ids (comma separated);
//! links are made symmetric on load.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use super::tag::{PartOfSpeech, Tag};
use crate::types::MorphError;

pub type LexemeId = u32;

const BUNDLED: &str = include_str!("../../data/morph_ru.dict");

/// A single inflected form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordForm {
    pub word: String,
    pub tag: Tag,
}

/// All inflected forms sharing one normal form
#[derive(Debug, Clone)]
pub struct Lexeme {
    pub id: LexemeId,
    pub forms: Vec<WordForm>,
    pub links: Vec<LexemeId>,
}

impl Lexeme {
    /// The dictionary form (first form of the lexeme)
    pub fn normal_form(&self) -> &str {
        // loader rejects lexemes without forms
        &self.forms[0].word
    }
}

/// Immutable collection of lexemes
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    lexemes: Vec<Lexeme>,
    by_id: HashMap<LexemeId, usize>,
}

impl Dictionary {
    /// Dictionary shipped with the crate (auto-service vocabulary)
    pub fn bundled() -> Result<Self, MorphError> {
        Self::parse(BUNDLED)
    }

    /// Load a dictionary file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MorphError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let dictionary = Self::parse(&text)?;
        info!(
            "Loaded morphological dictionary {} ({} lexemes)",
            path.display(),
            dictionary.len()
        );
        Ok(dictionary)
    }

    /// Parse dictionary text
    pub fn parse(text: &str) -> Result<Self, MorphError> {
        let mut dictionary = Dictionary::default();
        let mut current: Option<Lexeme> = None;

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim_start_matches('\u{feff}').trim();

            if line.is_empty() {
                if let Some(lexeme) = current.take() {
                    dictionary.push(lexeme)?;
                }
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            match current.as_mut() {
                None => current = Some(parse_header(line, line_no)?),
                Some(lexeme) => {
                    let (word, tag) = line.split_once('\t').ok_or_else(|| MorphError::Syntax {
                        line: line_no,
                        message: format!("expected FORM<TAB>TAG, got '{}'", line),
                    })?;
                    let word = word.trim().to_lowercase();
                    if word.is_empty() {
                        return Err(MorphError::Syntax {
                            line: line_no,
                            message: "empty word form".to_string(),
                        });
                    }
                    lexeme.forms.push(WordForm {
                        word,
                        tag: Tag::parse(tag),
                    });
                }
            }
        }

        if let Some(lexeme) = current.take() {
            dictionary.push(lexeme)?;
        }

        dictionary.resolve_links()?;
        Ok(dictionary)
    }

    fn push(&mut self, lexeme: Lexeme) -> Result<(), MorphError> {
        if lexeme.forms.is_empty() {
            return Err(MorphError::EmptyLexeme { id: lexeme.id });
        }
        if self.by_id.contains_key(&lexeme.id) {
            return Err(MorphError::DuplicateLexeme { id: lexeme.id });
        }
        self.by_id.insert(lexeme.id, self.lexemes.len());
        self.lexemes.push(lexeme);
        Ok(())
    }

    /// Validate link targets and add the reverse direction of every link.
    fn resolve_links(&mut self) -> Result<(), MorphError> {
        let mut reverse: Vec<(usize, LexemeId)> = Vec::new();

        for lexeme in &self.lexemes {
            for &target in &lexeme.links {
                let target_idx = *self.by_id.get(&target).ok_or(MorphError::UnknownLink {
                    from: lexeme.id,
                    to: target,
                })?;
                reverse.push((target_idx, lexeme.id));
            }
        }

        for (idx, source) in reverse {
            let links = &mut self.lexemes[idx].links;
            if !links.contains(&source) {
                links.push(source);
            }
        }
        Ok(())
    }

    /// Copy the lexeme links of `source` onto this dictionary.
    ///
    /// Lexemes are paired by normal form and part of speech. A link is
    /// skipped when either end has no counterpart here. Returns the number
    /// of links added, counting each direction.
    pub fn adopt_links(&mut self, source: &Dictionary) -> usize {
        let mut local: HashMap<LexemeKey, usize> = HashMap::new();
        for (idx, lexeme) in self.lexemes.iter().enumerate() {
            local.entry(LexemeKey::of(lexeme)).or_insert(idx);
        }

        let mut added = 0;
        for lexeme in &source.lexemes {
            let Some(&from) = local.get(&LexemeKey::of(lexeme)) else {
                continue;
            };
            for target in lexeme.links.iter().filter_map(|&id| source.lexeme(id)) {
                let Some(&to) = local.get(&LexemeKey::of(target)) else {
                    continue;
                };
                let to_id = self.lexemes[to].id;
                if from != to && !self.lexemes[from].links.contains(&to_id) {
                    self.lexemes[from].links.push(to_id);
                    added += 1;
                }
            }
        }

        info!("Adopted {} lexeme links", added);
        added
    }

    pub fn lexemes(&self) -> &[Lexeme] {
        &self.lexemes
    }

    pub fn lexeme(&self, id: LexemeId) -> Option<&Lexeme> {
        self.by_id.get(&id).map(|&idx| &self.lexemes[idx])
    }

    pub(crate) fn position(&self, id: LexemeId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.lexemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexemes.is_empty()
    }
}

/// Identity of a lexeme across dictionaries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LexemeKey {
    normal_form: String,
    pos: Option<PartOfSpeech>,
}

impl LexemeKey {
    fn of(lexeme: &Lexeme) -> Self {
        Self {
            normal_form: lexeme.normal_form().replace('ё', "е"),
            pos: lexeme.forms.first().and_then(|form| form.tag.pos()),
        }
    }
}

fn parse_header(line: &str, line_no: usize) -> Result<Lexeme, MorphError> {
    let (id_part, links_part) = match line.split_once('\t') {
        Some((id, links)) => (id, Some(links)),
        None => (line, None),
    };

    let id = parse_id(id_part, line_no)?;
    let links = links_part
        .map(|links| {
            links
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_id(s, line_no))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(Lexeme {
        id,
        forms: Vec::new(),
        links,
    })
}

fn parse_id(s: &str, line_no: usize) -> Result<LexemeId, MorphError> {
    s.trim().parse().map_err(|_| MorphError::Syntax {
        line: line_no,
        message: format!("invalid lexeme id '{}'", s.trim()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# sample
1
МАСЛО\tNOUN,inan,neut sing,nomn
масла\tNOUN,inan,neut sing,gent

2\t1
масляный\tADJF,Qual masc,sing,nomn
";

    #[test]
    fn test_parse_sample() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert_eq!(dict.len(), 2);

        let noun = dict.lexeme(1).unwrap();
        assert_eq!(noun.normal_form(), "масло");
        assert_eq!(noun.forms.len(), 2);
        assert!(noun.forms[1].tag.is(PartOfSpeech::Noun));

        let adj = dict.lexeme(2).unwrap();
        assert_eq!(adj.normal_form(), "масляный");
        assert_eq!(adj.links, vec![1]);
    }

    #[test]
    fn test_links_are_symmetric() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert_eq!(dict.lexeme(1).unwrap().links, vec![2]);
    }

    #[test]
    fn test_form_without_tab_reports_line() {
        let err = Dictionary::parse("\n1\nмасло NOUN\n").unwrap_err();
        match err {
            MorphError::Syntax { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_header() {
        let err = Dictionary::parse("abc\nмасло\tNOUN\n").unwrap_err();
        assert!(matches!(err, MorphError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_duplicate_lexeme() {
        let err = Dictionary::parse("1\nмасло\tNOUN\n\n1\nвода\tNOUN\n").unwrap_err();
        assert!(matches!(err, MorphError::DuplicateLexeme { id: 1 }));
    }

    #[test]
    fn test_empty_lexeme() {
        let err = Dictionary::parse("1\n\n2\nвода\tNOUN\n").unwrap_err();
        assert!(matches!(err, MorphError::EmptyLexeme { id: 1 }));
    }

    #[test]
    fn test_unknown_link() {
        let err = Dictionary::parse("1\t7\nмасло\tNOUN\n").unwrap_err();
        assert!(matches!(err, MorphError::UnknownLink { from: 1, to: 7 }));
    }

    #[test]
    fn test_adopt_links_by_normal_form() {
        let mut plain = Dictionary::parse(
            "10\nмасляный\tADJF,Qual masc,sing,nomn\n\n\
             20\nмасло\tNOUN,inan,neut sing,nomn\nмасла\tNOUN,inan,neut sing,gent\n\n\
             30\nвода\tNOUN,inan,femn sing,nomn\n",
        )
        .unwrap();
        assert!(plain.lexeme(20).unwrap().links.is_empty());

        let added = plain.adopt_links(&Dictionary::parse(SAMPLE).unwrap());
        assert_eq!(added, 2);
        assert_eq!(plain.lexeme(20).unwrap().links, vec![10]);
        assert_eq!(plain.lexeme(10).unwrap().links, vec![20]);
        assert!(plain.lexeme(30).unwrap().links.is_empty());

        // already present
        assert_eq!(plain.adopt_links(&Dictionary::parse(SAMPLE).unwrap()), 0);
    }

    #[test]
    fn test_adopt_links_requires_both_ends() {
        let mut plain = Dictionary::parse("5\nмасло\tNOUN,inan,neut sing,nomn\n").unwrap();
        assert_eq!(plain.adopt_links(&Dictionary::bundled().unwrap()), 0);
        assert!(plain.lexeme(5).unwrap().links.is_empty());
    }

    #[test]
    fn test_bundled_dictionary_loads() {
        let dict = Dictionary::bundled().unwrap();
        assert!(!dict.is_empty());
        let diagnostics = dict.lexeme(1).unwrap();
        assert_eq!(diagnostics.normal_form(), "диагностика");
        assert!(diagnostics.links.contains(&2));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.txt");
        std::fs::write(&path, SAMPLE).unwrap();
        let dict = Dictionary::from_file(&path).unwrap();
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = Dictionary::from_file("/nonexistent/dict.txt").unwrap_err();
        assert!(matches!(err, MorphError::Io(_)));
    }
}
