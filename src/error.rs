//! Error types for the price agent

use std::path::PathBuf;

use thiserror::Error;

pub use price_matcher::MorphError;

/// Price list loading failures
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Price list not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Query extraction failures. Either one aborts the turn.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("LLM call failed: {0}")]
    Llm(#[source] anyhow::Error),

    #[error("Malformed oracle response ({reason}): {raw}")]
    MalformedResponse { raw: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    InvalidBackend(String),

    #[error("API key not set: environment variable {var} is empty or missing")]
    MissingApiKey { var: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Top-level error of the agent pipeline
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Morph(#[from] MorphError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = AgentError> = std::result::Result<T, E>;
