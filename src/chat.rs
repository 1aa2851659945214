//! Gift finder: generative-model proxy
//!
//! Narrow seam over the external model API. The model is asked for a JSON
//! object with a reply and product ids; since it may wrap that JSON in
//! prose, extraction is tolerant. Any upstream or parse failure is the
//! caller's cue to fall back to keyword matching, never an error response.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::GiftModelConfig;
use crate::domain::Product;

const MAX_TOKENS: u32 = 1024;
/// Prior conversation turns included in the prompt.
const HISTORY_WINDOW: usize = 5;

#[derive(Clone)]
pub struct GiftFinder {
    inner: Option<Arc<Inner>>,
}

struct Inner {
    client: reqwest::Client,
    api_url: String,
    model: String,
}

/// One prior turn of the conversation as posted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub message: String,
}

/// Parsed model output: a reply for the user plus suggested product ids.
#[derive(Debug, Clone, Default)]
pub struct Suggestion {
    pub reply: Option<String>,
    pub product_ids: Vec<Uuid>,
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("gift model API unavailable: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("gift model is not configured")]
    NotConfigured,
}

#[derive(Serialize)]
struct ModelRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ModelMessage>,
}

#[derive(Serialize)]
struct ModelMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ModelResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct RawSuggestion {
    message: Option<String>,
    #[serde(rename = "productIds", default)]
    product_ids: Vec<String>,
}

impl GiftFinder {
    /// Builds the API client once; with no configuration the finder is
    /// inert and `suggest` always reports `NotConfigured`.
    pub fn new(config: Option<&GiftModelConfig>) -> Self {
        let inner = config.and_then(|cfg| {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers.insert("x-api-key", HeaderValue::from_str(&cfg.api_key).ok()?);
            headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
            let client = reqwest::Client::builder().default_headers(headers).build().ok()?;
            Some(Arc::new(Inner {
                client,
                api_url: cfg.api_url.clone(),
                model: cfg.model.clone(),
            }))
        });
        Self { inner }
    }

    /// Asks the model for gift suggestions given the user's message, a short
    /// rolling window of prior turns, and a catalog snapshot.
    pub async fn suggest(&self, message: &str, history: &[ChatTurn], catalog: &[Product]) -> Result<Suggestion, ChatError> {
        let inner = self.inner.as_ref().ok_or(ChatError::NotConfigured)?;
        let request = ModelRequest {
            model: inner.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![ModelMessage { role: "user", content: build_prompt(message, history, catalog) }],
        };

        let response: ModelResponse = inner
            .client
            .post(&inner.api_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = response.content.first().map(|b| b.text.as_str()).unwrap_or_default();
        tracing::debug!(raw = text, "gift model response");
        Ok(extract_suggestion(text))
    }
}

fn build_prompt(message: &str, history: &[ChatTurn], catalog: &[Product]) -> String {
    let context: Vec<String> = history
        .iter()
        .rev()
        .take(HISTORY_WINDOW)
        .rev()
        .map(|t| format!("{}: {}", t.sender, t.message))
        .collect();

    let products: Vec<serde_json::Value> = catalog
        .iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "name": p.name,
                "description": p.description,
                "category": p.category,
            })
        })
        .collect();

    format!(
        "Based on the following conversation about gift recommendations, suggest 3 relevant \
         products from the available options. Only suggest products that are highly relevant.\n\n\
         Conversation context:\n{}\n\n\
         Current message: {}\n\n\
         Available products:\n{}\n\n\
         Respond with JSON of the form:\n\
         {{\"message\": \"your reply to the user\", \"productIds\": [\"id1\", \"id2\", \"id3\"]}}",
        context.join("\n"),
        message,
        serde_json::Value::Array(products),
    )
}

/// Pulls the first `{...}` object out of the model's free text and parses
/// it. Text without parseable JSON becomes a plain reply with no ids;
/// unparseable ids are dropped.
pub fn extract_suggestion(text: &str) -> Suggestion {
    let candidate = text.find('{').and_then(|start| {
        let end = text.rfind('}')?;
        text.get(start..=end)
    });

    match candidate.and_then(|c| serde_json::from_str::<RawSuggestion>(c).ok()) {
        Some(raw) => Suggestion {
            reply: raw.message,
            product_ids: raw.product_ids.iter().filter_map(|s| s.parse().ok()).collect(),
        },
        None => Suggestion {
            reply: (!text.is_empty()).then(|| text.to_string()),
            product_ids: Vec::new(),
        },
    }
}

/// Keywords from the user's message worth matching against the catalog.
pub fn search_terms(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .map(|w| format!("%{w}%"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_json_wrapped_in_prose() {
        let id = Uuid::new_v4();
        let text = format!(
            "Sure, here are my picks!\n{{\"message\": \"Try these.\", \"productIds\": [\"{id}\"]}}\nHope that helps."
        );
        let s = extract_suggestion(&text);
        assert_eq!(s.reply.as_deref(), Some("Try these."));
        assert_eq!(s.product_ids, vec![id]);
    }

    #[test]
    fn test_plain_text_becomes_reply_without_ids() {
        let s = extract_suggestion("I could not decide on anything specific.");
        assert_eq!(s.reply.as_deref(), Some("I could not decide on anything specific."));
        assert!(s.product_ids.is_empty());
    }

    #[test]
    fn test_unparseable_ids_are_dropped() {
        let s = extract_suggestion(r#"{"message": "ok", "productIds": ["not-a-uuid"]}"#);
        assert_eq!(s.reply.as_deref(), Some("ok"));
        assert!(s.product_ids.is_empty());
    }

    #[test]
    fn test_empty_text() {
        let s = extract_suggestion("");
        assert!(s.reply.is_none());
        assert!(s.product_ids.is_empty());
    }

    #[test]
    fn test_search_terms_skip_short_words() {
        assert_eq!(search_terms("a mug for my dad"), vec!["%mug%", "%for%", "%dad%"]);
    }

    #[tokio::test]
    async fn test_unconfigured_finder_reports_not_configured() {
        let finder = GiftFinder::new(None);
        let err = finder.suggest("candles", &[], &[]).await.unwrap_err();
        assert!(matches!(err, ChatError::NotConfigured));
    }

    #[test]
    fn test_prompt_includes_recent_history_only() {
        let history: Vec<ChatTurn> = (0..8)
            .map(|i| ChatTurn { sender: "user".into(), message: format!("turn{i}") })
            .collect();
        let prompt = build_prompt("hello", &history, &[]);
        assert!(!prompt.contains("turn2"));
        assert!(prompt.contains("turn3"));
        assert!(prompt.contains("turn7"));
    }
}
