//! Query Extractor - uses the LLM to pull a service keyword phrase out of a
//! conversation
//!
//! The LLM never sees the price list. It only reduces the user's messages to
//! the words that could appear in a service name, or says it cannot.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::llm_client::LlmClient;
use crate::error::OracleError;

/// Rules given to the LLM for every extraction
pub const SYSTEM_PROMPT: &str = r#"Ты — аналитик пользовательских запросов.

Строгие правила:
1. НЕ придумывай услуги.
2. НЕ используй общие слова: "услуга", "работы", "сервис".
3. НЕ добавляй слов, которых нет в названии услуги.
4. НЕ используй слова: "цена", "стоимость", "сколько".
5. Если есть только одно слово из списка:
   «диагностика», «ремонт», «замена» — верни его.
6. normalized_query — только ключевые слова услуги,
   без союзов и предлогов.
7. Если не уверен — верни null.

Ответ строго в JSON:
{
  "normalized_query": "..." | null
}
"#;

/// Maps the user's side of a conversation to a keyword phrase
#[async_trait]
pub trait QueryExtractor: Send + Sync {
    /// `Ok(None)` when no confident phrase could be extracted
    async fn extract(&self, user_history: &str) -> Result<Option<String>, OracleError>;
}

/// LLM-backed extractor
pub struct LlmQueryExtractor {
    llm: Arc<dyn LlmClient>,
}

impl LlmQueryExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QueryExtractor for LlmQueryExtractor {
    #[instrument(skip(self, user_history), fields(provider = self.llm.provider_name(), model = self.llm.model_name()))]
    async fn extract(&self, user_history: &str) -> Result<Option<String>, OracleError> {
        let raw = self
            .llm
            .chat_json(SYSTEM_PROMPT, user_history)
            .await
            .map_err(OracleError::Llm)?;
        debug!(
            "Oracle raw response: {}",
            raw.chars().take(500).collect::<String>()
        );

        let query = parse_response(&raw).inspect_err(|e| warn!("{}", e))?;
        info!("Normalized query: {:?}", query);
        Ok(query)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct OracleResponse {
    #[serde(default)]
    normalized_query: Option<String>,
}

/// Parse the oracle's reply.
///
/// The reply must be a single JSON object whose only field is
/// `normalized_query` (string or null, missing reads as null). A markdown
/// code fence around the object is tolerated. A blank phrase reads as null.
pub fn parse_response(raw: &str) -> Result<Option<String>, OracleError> {
    let json_str = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let malformed = |reason: String| OracleError::MalformedResponse {
        raw: raw.to_string(),
        reason,
    };

    let value: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    let response: OracleResponse =
        serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;

    Ok(response
        .normalized_query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_phrase() {
        assert_eq!(
            parse_response(r#"{"normalized_query": "замена масла"}"#).unwrap(),
            Some("замена масла".to_string())
        );
    }

    #[test]
    fn test_parse_null_missing_and_blank() {
        assert_eq!(parse_response(r#"{"normalized_query": null}"#).unwrap(), None);
        assert_eq!(parse_response("{}").unwrap(), None);
        assert_eq!(parse_response(r#"{"normalized_query": "  "}"#).unwrap(), None);
    }

    #[test]
    fn test_parse_fenced() {
        let raw = "```json\n{\"normalized_query\": \"диагностика\"}\n```";
        assert_eq!(parse_response(raw).unwrap(), Some("диагностика".to_string()));
    }

    #[test]
    fn test_malformed_responses() {
        for raw in [
            "диагностика",
            "",
            r#"["диагностика"]"#,
            r#""диагностика""#,
            r#"{"normalized_query": "ремонт", "confidence": 0.9}"#,
            r#"{"normalized_query": 42}"#,
            r#"Вот ответ: {"normalized_query": "ремонт"}"#,
        ] {
            match parse_response(raw) {
                Err(OracleError::MalformedResponse { raw: kept, .. }) => assert_eq!(kept, raw),
                other => panic!("expected MalformedResponse for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_prompt_lists_price_words() {
        assert!(SYSTEM_PROMPT.contains("\"цена\", \"стоимость\", \"сколько\""));
        assert!(SYSTEM_PROMPT.contains("normalized_query"));
    }
}
