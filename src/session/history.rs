//! Conversation history keyed by thread.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ThreadId
// ---------------------------------------------------------------------------

/// Identity of one conversation (e.g. `cli:<uuid>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh thread for a local CLI session
    pub fn cli() -> Self {
        Self(format!("cli:{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Turn
// ---------------------------------------------------------------------------

/// A single message in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    User {
        text: String,
        timestamp: DateTime<Utc>,
    },
    Assistant {
        text: String,
        timestamp: DateTime<Utc>,
    },
    System {
        text: String,
        timestamp: DateTime<Utc>,
    },
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn::User {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn::Assistant {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Turn::User { text, .. } | Turn::Assistant { text, .. } | Turn::System { text, .. } => {
                text
            }
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Turn::User { .. })
    }
}

/// The user's side of a conversation, space-joined, as the oracle reads it
pub fn user_history<'a>(turns: impl IntoIterator<Item = &'a Turn>) -> String {
    turns
        .into_iter()
        .filter(|turn| turn.is_user())
        .map(Turn::text)
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// ConversationStore
// ---------------------------------------------------------------------------

/// Append-only turn logs with per-thread reset.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append turns to the end of the thread's log
    async fn append(&self, thread: &ThreadId, turns: Vec<Turn>);

    /// Thread's log in append order; empty for an unknown thread
    async fn history(&self, thread: &ThreadId) -> Vec<Turn>;

    /// Drop the thread's log. Returns whether anything was removed.
    async fn clear(&self, thread: &ThreadId) -> bool;
}

/// Process-local store; history is lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    threads: RwLock<HashMap<ThreadId, Vec<Turn>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append(&self, thread: &ThreadId, turns: Vec<Turn>) {
        self.threads
            .write()
            .await
            .entry(thread.clone())
            .or_default()
            .extend(turns);
    }

    async fn history(&self, thread: &ThreadId) -> Vec<Turn> {
        self.threads
            .read()
            .await
            .get(thread)
            .cloned()
            .unwrap_or_default()
    }

    async fn clear(&self, thread: &ThreadId) -> bool {
        self.threads.write().await.remove(thread).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_keeps_order() {
        let store = InMemoryConversationStore::new();
        let thread = ThreadId::new("t1");
        store
            .append(&thread, vec![Turn::user("a"), Turn::assistant("b")])
            .await;
        store.append(&thread, vec![Turn::user("c")]).await;

        let texts: Vec<String> = store
            .history(&thread)
            .await
            .iter()
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_clear_only_touches_one_thread() {
        let store = InMemoryConversationStore::new();
        let one = ThreadId::new("one");
        let two = ThreadId::new("two");
        store.append(&one, vec![Turn::user("x")]).await;
        store.append(&two, vec![Turn::user("y")]).await;

        assert!(store.clear(&one).await);
        assert!(!store.clear(&one).await);
        assert!(store.history(&one).await.is_empty());
        assert_eq!(store.history(&two).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_thread_is_empty() {
        let store = InMemoryConversationStore::new();
        assert!(store.history(&ThreadId::new("nobody")).await.is_empty());
    }

    #[test]
    fn test_user_history_joins_user_turns() {
        let turns = vec![
            Turn::System {
                text: "ignored".to_string(),
                timestamp: Utc::now(),
            },
            Turn::user("нужна замена"),
            Turn::assistant("В предоставленном прайс-листе нет информации по данному запросу."),
            Turn::user("масла"),
        ];
        assert_eq!(user_history(&turns), "нужна замена масла");
        assert_eq!(user_history(&Vec::<Turn>::new()), "");
    }

    #[test]
    fn test_turn_serializes_with_role_tag() {
        let json = serde_json::to_value(Turn::user("привет")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["text"], "привет");
    }

    #[test]
    fn test_cli_thread_ids_are_unique() {
        let a = ThreadId::cli();
        assert!(a.as_str().starts_with("cli:"));
        assert_ne!(a, ThreadId::cli());
    }
}
