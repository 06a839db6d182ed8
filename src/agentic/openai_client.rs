//! OpenAI-compatible Client
//!
//! LLM client for any endpoint speaking the OpenAI `/chat/completions`
//! protocol (OpenAI itself, GigaChat, local gateways).

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::backend::AgentBackend;
use super::gigachat_auth::TokenExchange;
use super::llm_client::LlmClient;

/// How chat requests are authorized
#[derive(Clone)]
enum Credentials {
    /// Key sent as the bearer token
    ApiKey(String),
    /// Key traded for short-lived bearer tokens
    Exchange(Arc<TokenExchange>),
}

/// Chat-completions API client
#[derive(Clone)]
pub struct OpenAiClient {
    credentials: Credentials,
    client: reqwest::Client,
    base_url: String,
    model: String,
    provider: &'static str,
    json_mode: bool,
}

impl OpenAiClient {
    /// Create a client for the given backend with its default endpoint, model
    /// and authorization
    pub fn new(backend: AgentBackend, api_key: String) -> Self {
        let credentials = if backend.uses_token_exchange() {
            Credentials::Exchange(Arc::new(TokenExchange::new(api_key)))
        } else {
            Credentials::ApiKey(api_key)
        };
        Self {
            credentials,
            client: reqwest::Client::new(),
            base_url: backend.default_base_url().to_string(),
            model: backend.default_model().to_string(),
            provider: backend.name(),
            json_mode: backend.supports_json_mode(),
        }
    }

    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the endpoint; a trailing slash is ignored
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Authorize with tokens from `exchange` instead of the plain key
    pub fn with_token_exchange(mut self, exchange: TokenExchange) -> Self {
        self.credentials = Credentials::Exchange(Arc::new(exchange));
        self
    }

    /// Skip TLS certificate verification. GigaChat serves certificates issued
    /// by the Russian Trusted Root CA, which the bundled roots lack.
    pub fn accept_invalid_certs(mut self) -> Result<Self, reqwest::Error> {
        warn!(provider = self.provider, "TLS certificate verification disabled");
        self.client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(self)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, system_prompt: &str, user_prompt: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": 0
        });

        if self.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }
        body
    }

    async fn authorization(&self) -> Result<String> {
        let token = match &self.credentials {
            Credentials::ApiKey(key) => key.clone(),
            Credentials::Exchange(exchange) => exchange.access_token(&self.client).await?,
        };
        Ok(format!("Bearer {}", token))
    }

    /// Internal API call implementation
    async fn call_api(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = self.request_body(system_prompt, user_prompt);
        let authorization = self.authorization().await?;

        debug!(
            provider = self.provider,
            model = %self.model,
            "POST {}",
            self.completions_url()
        );

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} API error {}: {}", self.provider, status, body));
        }

        #[derive(Deserialize)]
        struct Message {
            content: String,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response.json().await?;
        api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("{} returned no choices", self.provider))
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match &self.credentials {
            Credentials::ApiKey(_) => "api-key",
            Credentials::Exchange(_) => "token-exchange",
        };
        f.debug_struct("OpenAiClient")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("auth", &auth)
            .field("json_mode", &self.json_mode)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_json(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.call_api(system_prompt, user_prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        self.provider
    }
}
