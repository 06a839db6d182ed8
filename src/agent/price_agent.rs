//! Price Agent - one conversational turn from user text to reply
//!
//! ```text
//! history + text ─► QueryExtractor ─► normalized_query
//!                ─► CatalogIndex::search ─► render_answer ─► reply
//! ```
//!
//! All collaborators are injected; the agent itself holds no state.

use std::iter;
use std::sync::Arc;

use price_matcher::{CatalogEntry, CatalogIndex};
use serde::Serialize;
use tracing::{info, instrument};

use super::answer::{render_answer, GREETING};
use crate::agentic::QueryExtractor;
use crate::error::Result;
use crate::session::{user_history, ConversationStore, ThreadId, Turn};

/// Result of one handled message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    /// Phrase the oracle extracted, if any
    pub normalized_query: Option<String>,
    /// Matching price list entries, in price list order
    pub found: Vec<CatalogEntry>,
    /// Reply text appended to the conversation
    pub answer: String,
}

pub struct PriceAgent {
    index: Arc<CatalogIndex>,
    extractor: Arc<dyn QueryExtractor>,
    store: Arc<dyn ConversationStore>,
}

impl PriceAgent {
    pub fn new(
        index: Arc<CatalogIndex>,
        extractor: Arc<dyn QueryExtractor>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            index,
            extractor,
            store,
        }
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn greeting(&self) -> &'static str {
        GREETING
    }

    /// Handle one user message on `thread`.
    ///
    /// On any error the thread's history is left as it was.
    #[instrument(skip(self, text), fields(thread = %thread))]
    pub async fn handle_message(&self, thread: &ThreadId, text: &str) -> Result<TurnOutcome> {
        let normalized_query = self.analyze(thread, text).await?;
        let found = self.search(normalized_query.as_deref());
        let answer = render_answer(&found);

        self.store
            .append(thread, vec![Turn::user(text), Turn::assistant(answer.clone())])
            .await;

        Ok(TurnOutcome {
            normalized_query,
            found,
            answer,
        })
    }

    /// Forget the thread's history
    #[instrument(skip(self), fields(thread = %thread))]
    pub async fn reset(&self, thread: &ThreadId) {
        let removed = self.store.clear(thread).await;
        info!(removed, "Conversation history cleared");
    }

    /// Ask the oracle for a keyword phrase over all user turns so far
    async fn analyze(&self, thread: &ThreadId, text: &str) -> Result<Option<String>> {
        let history = self.store.history(thread).await;
        let current = Turn::user(text);
        let user_text = user_history(history.iter().chain(iter::once(&current)));
        Ok(self.extractor.extract(&user_text).await?)
    }

    fn search(&self, normalized_query: Option<&str>) -> Vec<CatalogEntry> {
        match normalized_query {
            Some(query) => self
                .index
                .search(Some(query))
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}
