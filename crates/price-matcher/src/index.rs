//! Catalog index with per-entry lemma caching
//!
//! Entry lemma sets depend only on the entry text and the analyzer, so they
//! are computed at most once per entry, on the first search that needs them.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use tracing::{info, instrument};

use crate::matcher::CatalogMatcher;
use crate::types::{CatalogEntry, LemmaSet, MatchExplanation};

/// Price list plus cached lemma sets, shareable across threads
#[derive(Debug)]
pub struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    lemma_sets: Vec<OnceLock<LemmaSet>>,
    matcher: Arc<CatalogMatcher>,
}

impl CatalogIndex {
    pub fn new(entries: Vec<CatalogEntry>, matcher: Arc<CatalogMatcher>) -> Self {
        info!("Indexing catalog with {} entries", entries.len());
        let lemma_sets = entries.iter().map(|_| OnceLock::new()).collect();
        Self {
            entries,
            lemma_sets,
            matcher,
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matcher(&self) -> &CatalogMatcher {
        &self.matcher
    }

    /// Cached expanded lemmas of entry `idx`
    pub fn entry_lemmas(&self, idx: usize) -> Option<&LemmaSet> {
        let entry = self.entries.get(idx)?;
        Some(self.lemma_sets[idx].get_or_init(|| self.matcher.entry_lemmas(entry)))
    }

    /// Entries matching `query`, in catalog order
    #[instrument(skip(self), fields(entries = self.entries.len()))]
    pub fn search(&self, query: Option<&str>) -> Vec<&CatalogEntry> {
        let pairs = self
            .entries
            .iter()
            .zip(&self.lemma_sets)
            .map(|(entry, cell)| {
                let lemmas = cell.get_or_init(|| self.matcher.entry_lemmas(entry));
                (entry, Cow::Borrowed(lemmas))
            });
        self.matcher.filter(pairs, query)
    }

    /// Explain the decision for entry `idx`
    pub fn explain(&self, query: &str, idx: usize) -> Option<MatchExplanation> {
        self.matcher.explain(query, self.entries.get(idx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::MorphAnalyzer;

    fn index() -> CatalogIndex {
        let matcher = CatalogMatcher::new(Arc::new(MorphAnalyzer::bundled().unwrap()));
        CatalogIndex::new(
            vec![
                CatalogEntry::new("Диагностика", "Компьютерная диагностика", "1500", ""),
                CatalogEntry::new("Ремонт двигателя", "Замена масла", "800", ""),
                CatalogEntry::new("Ремонт двигателя", "Замена воздушного фильтра", "", ""),
            ],
            Arc::new(matcher),
        )
    }

    #[test]
    fn test_search_uses_catalog_order() {
        let idx = index();
        let found = idx.search(Some("замена"));
        let names: Vec<&str> = found.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Замена масла", "Замена воздушного фильтра"]);
    }

    #[test]
    fn test_lemmas_computed_lazily_and_once() {
        let idx = index();
        assert!(idx.lemma_sets.iter().all(|cell| cell.get().is_none()));

        assert!(idx.search(None).is_empty());
        assert!(idx.lemma_sets.iter().all(|cell| cell.get().is_none()));

        idx.search(Some("масляный"));
        assert!(idx.lemma_sets.iter().all(|cell| cell.get().is_some()));

        let first = idx.entry_lemmas(1).unwrap() as *const LemmaSet;
        idx.search(Some("масляный"));
        assert_eq!(first, idx.entry_lemmas(1).unwrap() as *const LemmaSet);
    }

    #[test]
    fn test_cached_matches_uncached() {
        let idx = index();
        for query in ["масляный", "компьютер", "замена фильтра", "цена", "ремонт"] {
            let cached = idx.search(Some(query));
            let direct = idx.matcher().search(idx.entries(), Some(query));
            assert_eq!(cached, direct, "query {query}");
        }
    }

    #[test]
    fn test_entry_lemmas_out_of_range() {
        let idx = index();
        assert!(idx.entry_lemmas(3).is_none());
        assert!(idx.explain("замена", 3).is_none());
        assert_eq!(idx.len(), 3);
        assert!(!idx.is_empty());
    }
}
