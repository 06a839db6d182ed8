//! LLM plumbing: provider client, backend selection and the query oracle.

pub mod backend;
pub mod gigachat_auth;
pub mod llm_client;
pub mod openai_client;
pub mod query_extractor;

pub use backend::AgentBackend;
pub use gigachat_auth::TokenExchange;
pub use llm_client::LlmClient;
pub use openai_client::OpenAiClient;
pub use query_extractor::{LlmQueryExtractor, QueryExtractor};
