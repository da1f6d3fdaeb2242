//! Pure Gemini REST API client
//!
//! A clean, minimal client for the Gemini `generateContent` API with no
//! domain-specific logic. Generative replies are returned as raw text; the
//! caller owns any structure recovery.
//!
//! The response walker is deliberately defensive: candidate shapes have
//! drifted across API revisions, so the client tries the canonical
//! `candidates → content → parts` path first and falls back to the
//! alternate shapes observed in the wild before giving up.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::{Content, GeminiClient, GenerationConfig};
//!
//! let client = GeminiClient::from_env()?;
//! let reply = client
//!     .generate(
//!         vec![Content::user("Summarize the content concisely.")],
//!         GenerationConfig::creative(2000),
//!     )
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{GeminiError, Result};
pub use types::{Content, GenerateContentRequest, GenerationConfig, Part};

use std::time::Duration;

use tracing::{debug, warn};

/// Default model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Upper bound for a single generation round-trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeminiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        })
    }

    /// Create from environment variables `GEMINI_API_KEY` and (optionally)
    /// `GEMINI_MODEL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Config("GEMINI_API_KEY not set".into()))?;
        let mut client = Self::new(api_key)?;
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            client.model = model;
        }
        Ok(client)
    }

    /// Override the model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the base URL (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the configured model id.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one `generateContent` call and return the best available text.
    pub async fn generate(
        &self,
        contents: Vec<Content>,
        generation_config: GenerationConfig,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents,
            generation_config,
        };

        debug!(model = %self.model, "Sending generateContent request");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        if !status.is_success() {
            if body.to_lowercase().contains("quota") {
                return Err(GeminiError::QuotaExceeded(truncate(&body, 500)));
            }
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message: truncate(&body, 500),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            // Non-JSON success bodies still sometimes carry quota notices.
            if body.to_lowercase().contains("quota") {
                GeminiError::QuotaExceeded(truncate(&body, 500))
            } else {
                GeminiError::Parse(format!("response was not JSON: {e}"))
            }
        })?;

        match extract_reply_text(&value) {
            Some(text) => Ok(text),
            None => {
                warn!(model = %self.model, "No text found in generateContent response");
                Err(GeminiError::Parse("no text in response".into()))
            }
        }
    }
}

/// Walk a `generateContent` response and pull out the most plausible reply
/// text, trying shapes from most to least canonical.
fn extract_reply_text(value: &serde_json::Value) -> Option<String> {
    if let Some(candidate) = value.get("candidates").and_then(|c| c.get(0)) {
        // Canonical shape: candidates[0].content.parts[].text
        if let Some(parts) = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
        {
            let joined: String = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect();
            if !joined.trim().is_empty() {
                return Some(joined.trim().to_string());
            }
        }

        // Some revisions return content as a bare string.
        if let Some(text) = candidate.get("content").and_then(|c| c.as_str()) {
            if !text.trim().is_empty() {
                return Some(text.trim().to_string());
            }
        }

        // Or the text under an `output` key.
        if let Some(text) = candidate.get("output").and_then(|o| o.as_str()) {
            if !text.trim().is_empty() {
                return Some(text.trim().to_string());
            }
        }
    }

    // Alternate top-level keys seen in non-candidate responses.
    for key in ["output", "text", "response", "content"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            if !text.trim().is_empty() {
                return Some(text.trim().to_string());
            }
        }
    }

    None
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let end = s
            .char_indices()
            .take_while(|(i, _)| *i < max)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        s[..end].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_canonical_parts() {
        let value = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Hello "}, {"text": "world"}]
                }
            }]
        });
        assert_eq!(extract_reply_text(&value), Some("Hello world".to_string()));
    }

    #[test]
    fn test_extract_content_as_string() {
        let value = json!({"candidates": [{"content": "plain reply"}]});
        assert_eq!(extract_reply_text(&value), Some("plain reply".to_string()));
    }

    #[test]
    fn test_extract_candidate_output_key() {
        let value = json!({"candidates": [{"output": "from output"}]});
        assert_eq!(extract_reply_text(&value), Some("from output".to_string()));
    }

    #[test]
    fn test_extract_top_level_fallbacks() {
        let value = json!({"text": "top level"});
        assert_eq!(extract_reply_text(&value), Some("top level".to_string()));
    }

    #[test]
    fn test_extract_empty_response() {
        assert_eq!(extract_reply_text(&json!({})), None);
        assert_eq!(extract_reply_text(&json!({"candidates": []})), None);
        assert_eq!(
            extract_reply_text(&json!({"candidates": [{"content": {"parts": []}}]})),
            None
        );
    }

    #[test]
    fn test_retriable_classification() {
        assert!(GeminiError::Network("reset".into()).is_retriable());
        assert!(GeminiError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_retriable());
        assert!(!GeminiError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_retriable());
        assert!(!GeminiError::QuotaExceeded("quota".into()).is_retriable());
    }

    #[test]
    fn test_generation_config_serializes_camel_case() {
        let config = GenerationConfig::deterministic(50);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["maxOutputTokens"], 50);
        assert_eq!(value["topK"], 1);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
    }
}
