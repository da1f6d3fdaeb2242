// Generative AI implementation backed by the Gemini API
//
// This is the infrastructure implementation of BaseGenerativeAi.
// Business logic (what to prompt for) lives in domain layers.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use gemini_client::{Content, GeminiClient, GeminiError, GenerationConfig};

use super::retry::{retry, RetryPolicy};
use super::traits::{BaseGenerativeAi, CompletionParams};

/// Gemini-backed implementation of [`BaseGenerativeAi`].
///
/// Wraps the pure client with the shared retry policy; quota exhaustion and
/// client errors pass through untouched so domain code can degrade on them.
#[derive(Clone)]
pub struct GeminiAi {
    client: GeminiClient,
    retry_policy: RetryPolicy,
}

impl GeminiAi {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

#[async_trait]
impl BaseGenerativeAi for GeminiAi {
    async fn complete_turns(&self, turns: &[String], params: CompletionParams) -> Result<String> {
        let contents: Vec<Content> = turns.iter().map(Content::user).collect();
        let config = GenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
            ..GenerationConfig::default()
        };

        tracing::debug!(
            model = %self.client.model(),
            turns = turns.len(),
            "Calling Gemini API"
        );

        let reply = retry(
            &self.retry_policy,
            "gemini",
            GeminiError::is_retriable,
            || self.client.generate(contents.clone(), config.clone()),
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, model = %self.client.model(), "Gemini API call failed");
            e
        })
        .context("Failed to call Gemini API")?;

        tracing::debug!(reply_length = reply.len(), "Gemini API reply received");
        Ok(reply)
    }
}

/// Whether an error chain bottoms out in Gemini quota exhaustion.
pub fn is_quota_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<GeminiError>(),
        Some(GeminiError::QuotaExceeded(_))
    )
}
