//! Catalog Matcher - lemma-set coverage test against price list entries
//!
//! An entry matches a query when more than half of the query's expanded
//! lemmas appear among the expanded lemmas of the entry's name and category.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use crate::{
    morph::MorphAnalyzer,
    normalizer::Normalizer,
    types::{CatalogEntry, LemmaSet, MatchExplanation, MatcherConfig},
};

/// Lemma-overlap matcher for price list entries
///
/// Stateless apart from the shared analyzer; safe to share across threads.
#[derive(Debug, Clone)]
pub struct CatalogMatcher {
    normalizer: Normalizer,
    config: MatcherConfig,
}

impl CatalogMatcher {
    /// Create a matcher with the default threshold (strictly more than half)
    pub fn new(analyzer: Arc<MorphAnalyzer>) -> Self {
        Self::with_config(analyzer, MatcherConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(analyzer: Arc<MorphAnalyzer>, config: MatcherConfig) -> Self {
        info!(
            "Initializing CatalogMatcher (min_token_len={}, threshold={})",
            config.min_token_len, config.coverage_threshold
        );
        Self {
            normalizer: Normalizer::with_min_token_len(analyzer, config.min_token_len),
            config,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Expanded lemma set of a query; `None` when there is nothing to match on
    /// (absent, empty, or only non-content words).
    pub fn query_lemmas(&self, query: Option<&str>) -> Option<LemmaSet> {
        let query = query.map(str::trim).filter(|q| !q.is_empty())?;
        let lemmas = self.normalizer.lemma_set(query);
        (!lemmas.is_empty()).then_some(lemmas)
    }

    /// Expanded lemmas of the entry's name united with those of its category
    pub fn entry_lemmas(&self, entry: &CatalogEntry) -> LemmaSet {
        let mut lemmas = self.normalizer.lemma_set(&entry.name);
        lemmas.extend(self.normalizer.lemma_set(&entry.category));
        lemmas
    }

    /// Share of query lemmas present in the entry lemmas
    pub fn coverage(query_lemmas: &LemmaSet, entry_lemmas: &LemmaSet) -> f64 {
        if query_lemmas.is_empty() {
            return 0.0;
        }
        let matched = query_lemmas.intersection(entry_lemmas).count();
        matched as f64 / query_lemmas.len() as f64
    }

    /// Binary include decision for precomputed lemma sets
    pub fn is_match(&self, query_lemmas: &LemmaSet, entry_lemmas: &LemmaSet) -> bool {
        Self::coverage(query_lemmas, entry_lemmas) > self.config.coverage_threshold
    }

    /// Entries matching `query`, in catalog order.
    ///
    /// Entry lemmas are recomputed on every call; use
    /// [`CatalogIndex`](crate::CatalogIndex) to compute them once per entry.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub fn search<'a>(
        &self,
        entries: &'a [CatalogEntry],
        query: Option<&str>,
    ) -> Vec<&'a CatalogEntry> {
        self.filter(
            entries.iter().map(|e| (e, Cow::Owned(self.entry_lemmas(e)))),
            query,
        )
    }

    /// Shared filtering loop over lazily produced (entry, entry lemmas) pairs
    pub(crate) fn filter<'a, 'l>(
        &self,
        entries: impl Iterator<Item = (&'a CatalogEntry, Cow<'l, LemmaSet>)>,
        query: Option<&str>,
    ) -> Vec<&'a CatalogEntry> {
        let Some(query_lemmas) = self.query_lemmas(query) else {
            debug!("Query has no content lemmas, nothing to match");
            return Vec::new();
        };
        debug!("Query lemmas: {:?}", query_lemmas);

        let results: Vec<&CatalogEntry> = entries
            .filter(|(entry, lemmas)| {
                let included = self.is_match(&query_lemmas, lemmas);
                trace!(service = %entry.name, included, "entry checked");
                included
            })
            .map(|(entry, _)| entry)
            .collect();

        info!("{} catalog entries matched", results.len());
        results
    }

    /// Explain the decision for one entry; `None` when the query has no
    /// content lemmas.
    pub fn explain(&self, query: &str, entry: &CatalogEntry) -> Option<MatchExplanation> {
        let query_lemmas = self.query_lemmas(Some(query))?;
        let entry_lemmas = self.entry_lemmas(entry);
        let matched: LemmaSet = query_lemmas.intersection(&entry_lemmas).cloned().collect();
        let ratio = Self::coverage(&query_lemmas, &entry_lemmas);

        Some(MatchExplanation {
            included: ratio > self.config.coverage_threshold,
            query_lemmas,
            entry_lemmas,
            matched,
            ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> CatalogMatcher {
        CatalogMatcher::new(Arc::new(MorphAnalyzer::bundled().unwrap()))
    }

    fn entry(category: &str, name: &str) -> CatalogEntry {
        CatalogEntry::new(category, name, "", "")
    }

    #[test]
    fn test_empty_and_absent_queries() {
        let m = matcher();
        let catalog = vec![entry("Диагностика", "Диагностика двигателя")];
        assert!(m.search(&catalog, None).is_empty());
        assert!(m.search(&catalog, Some("")).is_empty());
        assert!(m.search(&catalog, Some("   ")).is_empty());
    }

    #[test]
    fn test_stop_word_only_query_has_no_lemmas() {
        let m = matcher();
        assert_eq!(m.query_lemmas(Some("и в на")), None);
        assert_eq!(m.query_lemmas(Some("123 ?!")), None);
        let catalog = vec![entry("", "Ремонт")];
        assert!(m.search(&catalog, Some("и в на")).is_empty());
    }

    #[test]
    fn test_category_lemmas_count() {
        let m = matcher();
        let catalog = vec![entry("Ремонт двигателя", "Замена свечей зажигания")];
        // "ремонт" only appears in the category
        assert_eq!(m.search(&catalog, Some("ремонт")).len(), 1);
    }

    #[test]
    fn test_coverage() {
        let q: LemmaSet = ["замена", "фильтр"].iter().map(|s| s.to_string()).collect();
        let u: LemmaSet = ["замена", "свеча"].iter().map(|s| s.to_string()).collect();
        assert!((CatalogMatcher::coverage(&q, &u) - 0.5).abs() < f64::EPSILON);
        assert_eq!(CatalogMatcher::coverage(&LemmaSet::new(), &u), 0.0);
    }

    #[test]
    fn test_half_coverage_is_excluded() {
        let m = matcher();
        let q: LemmaSet = ["замена", "фильтр"].iter().map(|s| s.to_string()).collect();
        let half: LemmaSet = ["замена", "свеча"].iter().map(|s| s.to_string()).collect();
        assert!(!m.is_match(&q, &half));
        assert!(m.is_match(&q, &q));
    }

    #[test]
    fn test_explain() {
        let m = matcher();
        let explanation = m
            .explain("замена фильтра", &entry("", "Замена свечей зажигания"))
            .unwrap();
        assert_eq!(explanation.matched.len(), 1);
        assert!(explanation.matched.contains("замена"));
        assert!((explanation.ratio - 0.5).abs() < f64::EPSILON);
        assert!(!explanation.included);

        assert!(m.explain("в на", &entry("", "Ремонт")).is_none());
    }

    #[test]
    fn test_custom_threshold() {
        let m = CatalogMatcher::with_config(
            Arc::new(MorphAnalyzer::bundled().unwrap()),
            MatcherConfig {
                coverage_threshold: 0.3,
                ..Default::default()
            },
        );
        let catalog = vec![entry("", "Замена свечей зажигания")];
        assert_eq!(m.search(&catalog, Some("замена фильтра")).len(), 1);
    }
}
