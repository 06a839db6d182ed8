//! Agent configuration
//!
//! Resolution order, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. Optional YAML file (`--config`)
//! 3. Environment: `PRICE_LIST_PATH`, `MORPH_DICT_PATH`, `AGENT_BACKEND`,
//!    `LLM_MODEL`, `LLM_BASE_URL`
//! 4. Command-line flags (applied by the binary)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agentic::gigachat_auth::DEFAULT_SCOPE;
use crate::agentic::{AgentBackend, OpenAiClient, TokenExchange};
use crate::error::ConfigError;
use price_matcher::{Dictionary, MatcherConfig, MorphAnalyzer};

pub const DEFAULT_PRICE_LIST_PATH: &str = "data/price_list.csv";
pub const DEFAULT_API_KEY_ENV: &str = "LLM_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub price_list_path: PathBuf,
    /// `None` uses the dictionary bundled with the matcher
    pub dictionary_path: Option<PathBuf>,
    pub backend: AgentBackend,
    /// `None` uses the backend's default model
    pub model: Option<String>,
    /// `None` uses the backend's default endpoint
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// OAuth scope for GigaChat token exchange
    pub gigachat_scope: String,
    /// `None` uses GigaChat's public OAuth endpoint
    pub oauth_url: Option<String>,
    /// Skip TLS certificate verification (GigaChat without the Russian root CA installed)
    pub accept_invalid_certs: bool,
    pub coverage_threshold: f64,
    pub min_token_len: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let matcher = MatcherConfig::default();
        Self {
            price_list_path: PathBuf::from(DEFAULT_PRICE_LIST_PATH),
            dictionary_path: None,
            backend: AgentBackend::default(),
            model: None,
            base_url: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            gigachat_scope: DEFAULT_SCOPE.to_string(),
            oauth_url: None,
            accept_invalid_certs: false,
            coverage_threshold: matcher.coverage_threshold,
            min_token_len: matcher.min_token_len,
        }
    }
}

impl AgentConfig {
    /// Defaults, overlaid with the YAML file if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// Load config from YAML file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Overlay values found through `lookup`. Empty values are ignored.
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("PRICE_LIST_PATH") {
            self.price_list_path = PathBuf::from(path);
        }
        if let Some(path) = get("MORPH_DICT_PATH") {
            self.dictionary_path = Some(PathBuf::from(path));
        }
        if let Some(backend) = get("AGENT_BACKEND") {
            self.backend = backend
                .parse()
                .map_err(|e: crate::agentic::backend::ParseBackendError| {
                    ConfigError::InvalidBackend(e.to_string())
                })?;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.model = Some(model);
        }
        if let Some(url) = get("LLM_BASE_URL") {
            self.base_url = Some(url);
        }
        Ok(())
    }

    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            min_token_len: self.min_token_len,
            coverage_threshold: self.coverage_threshold,
        }
    }

    /// Analyzer over the configured dictionary, or the bundled one.
    ///
    /// A configured dictionary gets the bundled noun/adjective links copied
    /// onto it; plain OpenCorpora exports carry none.
    pub fn analyzer(&self) -> Result<Arc<MorphAnalyzer>, price_matcher::MorphError> {
        let dictionary = match &self.dictionary_path {
            Some(path) => {
                let mut dictionary = Dictionary::from_file(path)?;
                dictionary.adopt_links(&Dictionary::bundled()?);
                dictionary
            }
            None => Dictionary::bundled()?,
        };
        Ok(Arc::new(MorphAnalyzer::new(dictionary)))
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_base_url())
    }

    /// API key from the configured variable, looked up through `lookup`
    pub fn api_key_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        lookup(&self.api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                var: self.api_key_env.clone(),
            })
    }

    /// Chat-completions client for the configured backend
    pub fn llm_client(&self) -> Result<OpenAiClient, ConfigError> {
        let api_key = self.api_key_from(|key| std::env::var(key).ok())?;
        self.llm_client_with_key(api_key)
    }

    fn llm_client_with_key(&self, api_key: String) -> Result<OpenAiClient, ConfigError> {
        info!(
            "Using {} backend (model {}, endpoint {})",
            self.backend,
            self.model(),
            self.base_url()
        );
        let mut client = OpenAiClient::new(self.backend, api_key.clone())
            .with_model(self.model())
            .with_base_url(self.base_url());

        if self.backend.uses_token_exchange() {
            let mut exchange = TokenExchange::new(api_key).with_scope(&self.gigachat_scope);
            if let Some(url) = &self.oauth_url {
                exchange = exchange.with_oauth_url(url);
            }
            debug!("Token exchange: {:?}", exchange);
            client = client.with_token_exchange(exchange);
        }
        if self.accept_invalid_certs {
            client = client.accept_invalid_certs()?;
        }
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agentic::LlmClient;
    use price_matcher::{LemmaSet, Normalizer};
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.price_list_path, PathBuf::from("data/price_list.csv"));
        assert_eq!(config.dictionary_path, None);
        assert_eq!(config.backend, AgentBackend::OpenAi);
        assert_eq!(config.api_key_env, "LLM_API_KEY");
        assert_eq!(config.coverage_threshold, 0.5);
        assert_eq!(config.min_token_len, 3);
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.gigachat_scope, "GIGACHAT_API_PERS");
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AgentConfig::from_yaml("backend: gigachat\nmodel: GigaChat-Pro\n").unwrap();
        assert_eq!(config.backend, AgentBackend::GigaChat);
        assert_eq!(config.model(), "GigaChat-Pro");
        assert_eq!(config.base_url(), AgentBackend::GigaChat.default_base_url());
        assert_eq!(config.price_list_path, PathBuf::from("data/price_list.csv"));
    }

    #[test]
    fn test_unknown_yaml_key_is_rejected() {
        let err = AgentConfig::from_yaml("treshold: 0.7\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_env_overrides_yaml() {
        let mut config = AgentConfig::from_yaml("price_list_path: a.csv\nmodel: m1\n").unwrap();
        config
            .apply_env_from(env(&[
                ("PRICE_LIST_PATH", "b.csv"),
                ("LLM_MODEL", "m2"),
                ("LLM_BASE_URL", ""),
                ("MORPH_DICT_PATH", "/opt/dict.txt"),
            ]))
            .unwrap();
        assert_eq!(config.price_list_path, PathBuf::from("b.csv"));
        assert_eq!(config.model(), "m2");
        assert_eq!(config.base_url(), AgentBackend::OpenAi.default_base_url());
        assert_eq!(config.dictionary_path, Some(PathBuf::from("/opt/dict.txt")));
    }

    #[test]
    fn test_invalid_backend() {
        let mut config = AgentConfig::default();
        let err = config
            .apply_env_from(env(&[("AGENT_BACKEND", "telegraph")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackend(_)));
    }

    #[test]
    fn test_api_key() {
        let config = AgentConfig::default();
        assert_eq!(
            config.api_key_from(env(&[("LLM_API_KEY", " sk-1 ")])).unwrap(),
            "sk-1"
        );
        let err = config.api_key_from(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { var } if var == "LLM_API_KEY"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.yaml");
        std::fs::write(&path, "coverage_threshold: 0.6\nmin_token_len: 4\n").unwrap();
        let config = AgentConfig::from_file(&path).unwrap();
        assert_eq!(config.matcher_config().coverage_threshold, 0.6);
        assert_eq!(config.matcher_config().min_token_len, 4);
    }

    #[test]
    fn test_gigachat_client_from_yaml() {
        let config = AgentConfig::from_yaml(
            "backend: gigachat\n\
             gigachat_scope: GIGACHAT_API_CORP\n\
             oauth_url: http://127.0.0.1:9/oauth\n\
             accept_invalid_certs: true\n",
        )
        .unwrap();
        assert_eq!(config.gigachat_scope, "GIGACHAT_API_CORP");

        let client = config.llm_client_with_key("auth-key".to_string()).unwrap();
        assert_eq!(client.provider_name(), "GigaChat");
        let debug = format!("{:?}", client);
        assert!(debug.contains("token-exchange"));
        assert!(!debug.contains("auth-key"));
    }

    #[test]
    fn test_openai_client_uses_plain_key() {
        let client = AgentConfig::default()
            .llm_client_with_key("sk-1".to_string())
            .unwrap();
        assert_eq!(client.model_name(), "gpt-4o-mini");
        assert!(format!("{:?}", client).contains("api-key"));
    }

    #[test]
    fn test_bundled_analyzer() {
        let analyzer = AgentConfig::default().analyzer().unwrap();
        assert!(!analyzer.dictionary().is_empty());
    }

    #[test]
    fn test_external_dictionary_keeps_bundled_links() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.dict");
        std::fs::write(
            &path,
            "1\nмасло\tNOUN,inan,neut sing,nomn\nмасла\tNOUN,inan,neut sing,gent\n\n\
             2\nмасляный\tADJF,Qual masc,sing,nomn\nмасляного\tADJF,Qual masc,sing,gent\n",
        )
        .unwrap();
        let config = AgentConfig {
            dictionary_path: Some(path),
            ..AgentConfig::default()
        };

        let analyzer = config.analyzer().unwrap();
        assert_eq!(analyzer.dictionary().len(), 2);
        let normalizer = Normalizer::new(analyzer);
        let expected: LemmaSet = ["масло", "масляный"].iter().map(|s| s.to_string()).collect();
        assert_eq!(normalizer.lemma_set("масла"), expected);
    }
}
