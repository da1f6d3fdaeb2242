//! Dev.to article publishing client.

use anyhow::{Context as _, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const DEVTO_ARTICLES_URL: &str = "https://dev.to/api/articles";

#[derive(Debug, Serialize)]
struct ArticleBody {
    title: String,
    body_markdown: String,
    published: bool,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ArticleRequest {
    article: ArticleBody,
}

/// Minimal Dev.to publishing client.
pub struct DevToClient {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl DevToClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { api_key, client })
    }

    /// Publish an article and return its public URL.
    pub async fn publish_article(
        &self,
        title: &str,
        content: &str,
        tags: Option<Vec<String>>,
        published: bool,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Dev.to API key not configured. Please set DEVTO_API_KEY.")?;

        let request = ArticleRequest {
            article: ArticleBody {
                title: title.to_string(),
                body_markdown: content.to_string(),
                published,
                tags: tags.unwrap_or_else(|| {
                    vec![
                        "ai".to_string(),
                        "content_generation".to_string(),
                        "justspeak".to_string(),
                    ]
                }),
            },
        };

        debug!(title, "Publishing article to Dev.to");

        let response = self
            .client
            .post(DEVTO_ARTICLES_URL)
            .header("api-key", api_key)
            .json(&request)
            .send()
            .await
            .context("Connection error posting to Dev.to")?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("Dev.to returned a non-JSON response (status {status})"))?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Unknown Dev.to API error");
            anyhow::bail!("Dev.to API returned status {status}: {message}");
        }

        body.get("url")
            .and_then(|u| u.as_str())
            .map(String::from)
            .context("Dev.to did not return an article URL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_a_configuration_error() {
        let client = DevToClient::new(None).unwrap();
        let err = client
            .publish_article("t", "c", None, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API key not configured"));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ArticleRequest {
            article: ArticleBody {
                title: "T".to_string(),
                body_markdown: "body".to_string(),
                published: true,
                tags: vec!["ai".to_string()],
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["article"]["title"], "T");
        assert_eq!(value["article"]["body_markdown"], "body");
        assert_eq!(value["article"]["tags"][0], "ai");
    }
}
