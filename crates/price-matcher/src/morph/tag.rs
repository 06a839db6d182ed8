//! Grammatical tags in OpenCorpora notation.
//!
//! A tag string looks like `NOUN,inan,femn sing,nomn`: the first token is the
//! part of speech, the remaining comma/space separated tokens are grammemes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Part of speech (OpenCorpora POS grammemes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    /// Noun
    Noun,
    /// Full adjective
    Adjf,
    /// Short adjective
    Adjs,
    /// Comparative
    Comp,
    /// Finite verb
    Verb,
    /// Infinitive
    Infn,
    /// Full participle
    Prtf,
    /// Short participle
    Prts,
    /// Gerund
    Grnd,
    /// Numeral
    Numr,
    /// Adverb
    Advb,
    /// Pronoun-noun
    Npro,
    /// Predicative
    Pred,
    /// Preposition
    Prep,
    /// Conjunction
    Conj,
    /// Particle
    Prcl,
    /// Interjection
    Intj,
}

impl PartOfSpeech {
    /// OpenCorpora code, e.g. `NOUN`
    pub fn code(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "NOUN",
            PartOfSpeech::Adjf => "ADJF",
            PartOfSpeech::Adjs => "ADJS",
            PartOfSpeech::Comp => "COMP",
            PartOfSpeech::Verb => "VERB",
            PartOfSpeech::Infn => "INFN",
            PartOfSpeech::Prtf => "PRTF",
            PartOfSpeech::Prts => "PRTS",
            PartOfSpeech::Grnd => "GRND",
            PartOfSpeech::Numr => "NUMR",
            PartOfSpeech::Advb => "ADVB",
            PartOfSpeech::Npro => "NPRO",
            PartOfSpeech::Pred => "PRED",
            PartOfSpeech::Prep => "PREP",
            PartOfSpeech::Conj => "CONJ",
            PartOfSpeech::Prcl => "PRCL",
            PartOfSpeech::Intj => "INTJ",
        }
    }

    /// Open word classes whose endings are used to guess unknown words.
    pub fn is_productive(&self) -> bool {
        matches!(
            self,
            PartOfSpeech::Noun
                | PartOfSpeech::Adjf
                | PartOfSpeech::Adjs
                | PartOfSpeech::Comp
                | PartOfSpeech::Verb
                | PartOfSpeech::Infn
                | PartOfSpeech::Prtf
                | PartOfSpeech::Prts
                | PartOfSpeech::Grnd
        )
    }
}

impl FromStr for PartOfSpeech {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NOUN" => PartOfSpeech::Noun,
            "ADJF" => PartOfSpeech::Adjf,
            "ADJS" => PartOfSpeech::Adjs,
            "COMP" => PartOfSpeech::Comp,
            "VERB" => PartOfSpeech::Verb,
            "INFN" => PartOfSpeech::Infn,
            "PRTF" => PartOfSpeech::Prtf,
            "PRTS" => PartOfSpeech::Prts,
            "GRND" => PartOfSpeech::Grnd,
            "NUMR" => PartOfSpeech::Numr,
            "ADVB" => PartOfSpeech::Advb,
            "NPRO" => PartOfSpeech::Npro,
            "PRED" => PartOfSpeech::Pred,
            "PREP" => PartOfSpeech::Prep,
            "CONJ" => PartOfSpeech::Conj,
            "PRCL" => PartOfSpeech::Prcl,
            "INTJ" => PartOfSpeech::Intj,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parsed grammatical tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    raw: String,
    pos: Option<PartOfSpeech>,
    grammemes: Vec<String>,
}

impl Tag {
    /// Tag assigned to words nothing in the dictionary could explain
    pub const UNKNOWN: &'static str = "UNKN";

    /// Parse an OpenCorpora tag string.
    ///
    /// Never fails: an unrecognised leading token leaves `pos` empty and is
    /// kept as a grammeme.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut tokens = raw
            .split([',', ' '])
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .peekable();

        let pos = tokens.peek().and_then(|t| t.parse::<PartOfSpeech>().ok());
        if pos.is_some() {
            tokens.next();
        }

        Self {
            raw: raw.to_string(),
            pos,
            grammemes: tokens.collect(),
        }
    }

    pub fn unknown() -> Self {
        Self::parse(Self::UNKNOWN)
    }

    pub fn pos(&self) -> Option<PartOfSpeech> {
        self.pos
    }

    /// True when the tag's part of speech is `pos`
    pub fn is(&self, pos: PartOfSpeech) -> bool {
        self.pos == Some(pos)
    }

    pub fn has_grammeme(&self, grammeme: &str) -> bool {
        self.grammemes.iter().any(|g| g == grammeme)
    }

    pub fn grammemes(&self) -> &[String] {
        &self.grammemes
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
