//! Price list matcher
//!
//! Morphology-aware selection of price list entries for a Russian query.
//! Query and entry text are reduced to normal forms, expanded with their
//! noun/adjective partners, and compared as sets.
//!
//! # Architecture
//!
//! ```text
//! Query text ("сколько стоит замена масла")
//!       │
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  Normalizer                             │
//! │  tokenize → lemmatize → expand          │
//! │  {сколько, стоить, замена, масло,       │
//! │   масляный}                             │
//! └─────────────────────────────────────────┘
//!       │           ▲
//!       │           │ lemma / paradigm
//!       │   ┌───────┴─────────────────────────┐
//!       │   │  MorphAnalyzer                  │
//!       │   │  dictionary → suffix → stemmer  │
//!       │   └─────────────────────────────────┘
//!       ▼
//! ┌─────────────────────────────────────────┐
//! │  CatalogMatcher / CatalogIndex          │
//! │  |Q ∩ U| / |Q| > 0.5  → include entry   │
//! └─────────────────────────────────────────┘
//! ```

pub mod index;
pub mod matcher;
pub mod morph;
pub mod normalizer;
pub mod types;

pub use index::CatalogIndex;
pub use matcher::CatalogMatcher;
pub use morph::{Dictionary, MorphAnalyzer, Parse, ParseMethod, PartOfSpeech, Tag};
pub use normalizer::Normalizer;
pub use types::*;
