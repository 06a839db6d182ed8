//! Conversation state for the agent.

pub mod history;

pub use history::{user_history, ConversationStore, InMemoryConversationStore, ThreadId, Turn};
