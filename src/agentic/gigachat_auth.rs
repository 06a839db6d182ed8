//! GigaChat Access Tokens
//!
//! GigaChat rejects the authorization key on chat requests. The key is sent
//! once to the OAuth endpoint (HTTP Basic, plus a scope and a request id) and
//! traded for a short-lived access token, which then goes out as `Bearer`.
//! Tokens are cached and refreshed shortly before they expire.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

pub const GIGACHAT_OAUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";

/// Scope for personal accounts
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";

/// Refresh this long before the reported expiry
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// OAuth reply; `expires_at` is in milliseconds since the epoch
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_at: i64,
}

pub(crate) fn parse_token_response(body: &str) -> Result<AccessToken> {
    let response: TokenResponse =
        serde_json::from_str(body).context("Malformed GigaChat token response")?;
    let expires_at = Utc
        .timestamp_millis_opt(response.expires_at)
        .single()
        .ok_or_else(|| anyhow!("Invalid token expiry {}", response.expires_at))?;
    Ok(AccessToken {
        value: response.access_token,
        expires_at,
    })
}

/// Authorization key exchanged for cached access tokens
pub struct TokenExchange {
    credentials: String,
    scope: String,
    oauth_url: String,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenExchange {
    pub fn new(credentials: String) -> Self {
        Self {
            credentials,
            scope: DEFAULT_SCOPE.to_string(),
            oauth_url: GIGACHAT_OAUTH_URL.to_string(),
            cached: Mutex::new(None),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_oauth_url(mut self, oauth_url: impl Into<String>) -> Self {
        self.oauth_url = oauth_url.into();
        self
    }

    /// Current access token, requesting a new one when the cache is stale
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.request(client).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) async fn store(&self, token: AccessToken) {
        *self.cached.lock().await = Some(token);
    }

    async fn request(&self, client: &reqwest::Client) -> Result<AccessToken> {
        debug!(scope = %self.scope, "POST {}", self.oauth_url);

        let response = client
            .post(&self.oauth_url)
            .header("Authorization", format!("Basic {}", self.credentials))
            .header("RqUID", Uuid::new_v4().to_string())
            .header("Accept", "application/json")
            .form(&[("scope", self.scope.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GigaChat OAuth error {}: {}", status, body));
        }

        let token = parse_token_response(&response.text().await?)?;
        info!(expires_at = %token.expires_at, "GigaChat access token issued");
        Ok(token)
    }
}

impl std::fmt::Debug for TokenExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchange")
            .field("scope", &self.scope)
            .field("oauth_url", &self.oauth_url)
            .finish_non_exhaustive()
    }
}
