//! Backend Selection
//!
//! Enum for selecting the chat-completion provider. Both speak the
//! OpenAI-compatible `/chat/completions` protocol. They differ in endpoint,
//! default model, authorization and JSON response mode: GigaChat trades its
//! key for OAuth access tokens and does not accept `response_format`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// LLM backend provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentBackend {
    /// OpenAI GPT (default)
    #[default]
    OpenAi,
    /// Sber GigaChat
    GigaChat,
}

impl AgentBackend {
    /// Create from AGENT_BACKEND environment variable
    ///
    /// Valid values: "openai", "gpt", "gigachat"
    /// Defaults to OpenAI if not set
    pub fn from_env() -> Result<Self, ConfigError> {
        let value = std::env::var("AGENT_BACKEND").unwrap_or_else(|_| "openai".to_string());
        value
            .parse()
            .map_err(|e: ParseBackendError| ConfigError::InvalidBackend(e.to_string()))
    }

    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            AgentBackend::OpenAi => "OpenAI",
            AgentBackend::GigaChat => "GigaChat",
        }
    }

    /// Base URL of the chat-completions API
    pub fn default_base_url(&self) -> &'static str {
        match self {
            AgentBackend::OpenAi => "https://api.openai.com/v1",
            AgentBackend::GigaChat => "https://gigachat.devices.sberbank.ru/api/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AgentBackend::OpenAi => "gpt-4o-mini",
            AgentBackend::GigaChat => "GigaChat",
        }
    }

    /// Whether requests may carry `response_format: json_object`
    pub fn supports_json_mode(&self) -> bool {
        matches!(self, AgentBackend::OpenAi)
    }

    /// Whether the configured key must be exchanged for access tokens
    pub fn uses_token_exchange(&self) -> bool {
        matches!(self, AgentBackend::GigaChat)
    }
}

/// Error type for parsing AgentBackend
#[derive(Debug)]
pub struct ParseBackendError(String);

impl std::fmt::Display for ParseBackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseBackendError {}

impl FromStr for AgentBackend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(AgentBackend::OpenAi),
            "gigachat" => Ok(AgentBackend::GigaChat),
            other => Err(ParseBackendError(format!(
                "Unknown AGENT_BACKEND '{}'. Valid values: openai, gpt, gigachat",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AgentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
