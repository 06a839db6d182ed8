//! Russian morphology: word-form dictionary, tags and the analyzer built on them.

pub mod analyzer;
pub mod dictionary;
pub mod tag;

pub use analyzer::{MorphAnalyzer, Parse, ParseMethod};
pub use dictionary::{Dictionary, Lexeme, LexemeId, WordForm};
pub use tag::{PartOfSpeech, Tag};
