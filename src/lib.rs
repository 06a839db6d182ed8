//! Price agent
//!
//! Answers questions about an auto service's price list. A language model
//! reduces the conversation to a keyword phrase; the phrase is matched
//! against the price list morphologically by the `price-matcher` crate.
//!
//! ```text
//! user text ─► ConversationStore ─► QueryExtractor (LLM)
//!           ─► CatalogIndex::search ─► render_answer ─► reply
//! ```

pub mod agent;
pub mod agentic;
pub mod catalog;
pub mod config;
pub mod error;
pub mod session;

pub use agent::{render_answer, PriceAgent, TurnOutcome};
pub use agentic::{AgentBackend, LlmClient, LlmQueryExtractor, OpenAiClient, QueryExtractor};
pub use catalog::{load_price_list, load_price_list_from_reader};
pub use config::AgentConfig;
pub use error::{AgentError, CatalogError, ConfigError, OracleError};
pub use session::{ConversationStore, InMemoryConversationStore, ThreadId, Turn};

pub use price_matcher;
