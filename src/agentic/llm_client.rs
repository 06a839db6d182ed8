//! LLM Client Trait
//!
//! Provider-neutral interface used by the query extractor.

use anyhow::Result;
use async_trait::async_trait;

/// Chat-completion client for one model
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Call the LLM expecting a JSON object back.
    ///
    /// Providers that support a JSON response mode should enable it; the
    /// returned text is still validated by the caller.
    async fn chat_json(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Get the model name for logging
    fn model_name(&self) -> &str;

    /// Get the provider name for logging
    fn provider_name(&self) -> &str;
}
