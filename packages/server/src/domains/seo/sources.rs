//! External content sources for related-post enrichment.
//!
//! Each source is one capability ("fetch and parse posts for a keyword")
//! behind the `RelatedPostSource` trait. The fan-out runs every source
//! concurrently and joins them; a source failing or timing out degrades to
//! an empty contribution for that source only, never aborting the batch.
//! Server-side errors retry with backoff and jitter; client errors (4xx)
//! short-circuit straight to the degraded result.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::data::RelatedPostData;
use crate::kernel::retry::{retry, RetryPolicy};

/// Upper bound for one source request.
const SOURCE_TIMEOUT: Duration = Duration::from_secs(15);

/// Posts taken from each source per keyword.
const POSTS_PER_SOURCE: usize = 3;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/109.0.1518.78",
];

lazy_static! {
    static ref IMG_SRC: Regex = Regex::new(r#"<img[^>]*src="([^"]*)""#).expect("img src pattern");
}

fn random_user_agent() -> &'static str {
    USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
}

/// Source request errors, classified for the retry policy.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid payload: {0}")]
    Payload(String),
}

impl SourceError {
    pub fn is_retriable(&self) -> bool {
        match self {
            SourceError::Network(_) => true,
            SourceError::Status(status) => *status >= 500,
            SourceError::Payload(_) => false,
        }
    }
}

/// One external source of related posts.
#[async_trait]
pub trait RelatedPostSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, keyword: &str) -> Result<Vec<RelatedPostData>, SourceError>;
}

async fn fetch_json(client: &reqwest::Client, url: &str) -> Result<Value, SourceError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, random_user_agent())
        .send()
        .await
        .map_err(|e| SourceError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }

    response
        .json()
        .await
        .map_err(|e| SourceError::Payload(e.to_string()))
}

// =============================================================================
// Reddit
// =============================================================================

pub struct RedditSource {
    client: reqwest::Client,
}

#[async_trait]
impl RelatedPostSource for RedditSource {
    fn name(&self) -> &'static str {
        "Reddit"
    }

    async fn fetch(&self, keyword: &str) -> Result<Vec<RelatedPostData>, SourceError> {
        let url = format!(
            "https://www.reddit.com/search.json?q={}&limit={}",
            urlencoding::encode(keyword),
            POSTS_PER_SOURCE
        );
        let body = fetch_json(&self.client, &url).await?;

        let children = body
            .pointer("/data/children")
            .and_then(|c| c.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(children
            .iter()
            .filter_map(|item| {
                let data = item.get("data")?;
                let thumbnail = data
                    .get("thumbnail")
                    .and_then(|t| t.as_str())
                    .filter(|t| t.starts_with("http"))
                    .unwrap_or("");
                Some(RelatedPostData {
                    title: str_or(data, "title", "No Title"),
                    link: format!(
                        "https://reddit.com{}",
                        data.get("permalink").and_then(|p| p.as_str()).unwrap_or("")
                    ),
                    source: "Reddit".to_string(),
                    image: thumbnail.to_string(),
                })
            })
            .take(POSTS_PER_SOURCE)
            .collect())
    }
}

// =============================================================================
// Hacker News (Algolia)
// =============================================================================

pub struct HackerNewsSource {
    client: reqwest::Client,
}

#[async_trait]
impl RelatedPostSource for HackerNewsSource {
    fn name(&self) -> &'static str {
        "Hacker News"
    }

    async fn fetch(&self, keyword: &str) -> Result<Vec<RelatedPostData>, SourceError> {
        let url = format!(
            "http://hn.algolia.com/api/v1/search?query={}&tags=story&hitsPerPage={}",
            urlencoding::encode(keyword),
            POSTS_PER_SOURCE
        );
        let body = fetch_json(&self.client, &url).await?;

        let hits = body
            .get("hits")
            .and_then(|h| h.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(hits
            .iter()
            .map(|hit| RelatedPostData {
                title: str_or(hit, "title", "No Title"),
                link: str_or(hit, "url", ""),
                source: "Hacker News".to_string(),
                image: String::new(),
            })
            .take(POSTS_PER_SOURCE)
            .collect())
    }
}

// =============================================================================
// Medium (via RSS-to-JSON bridge)
// =============================================================================

pub struct MediumSource {
    client: reqwest::Client,
}

#[async_trait]
impl RelatedPostSource for MediumSource {
    fn name(&self) -> &'static str {
        "Medium"
    }

    async fn fetch(&self, keyword: &str) -> Result<Vec<RelatedPostData>, SourceError> {
        let url = format!(
            "https://api.rss2json.com/v1/api.json?rss_url=https://medium.com/feed/tag/{}",
            urlencoding::encode(keyword)
        );
        let body = fetch_json(&self.client, &url).await?;

        let items = body
            .get("items")
            .and_then(|i| i.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(items
            .iter()
            .map(|item| {
                let content = item.get("content").and_then(|c| c.as_str()).unwrap_or("");
                let image = IMG_SRC
                    .captures(content)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                RelatedPostData {
                    title: str_or(item, "title", "No Title"),
                    link: str_or(item, "link", ""),
                    source: "Medium".to_string(),
                    image,
                }
            })
            .take(POSTS_PER_SOURCE)
            .collect())
    }
}

fn str_or(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

// =============================================================================
// Page previews (title + image for posts missing one)
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct PagePreview {
    pub title: String,
    pub image: String,
}

/// Fetches a page and scrapes its title and social-preview image.
pub struct PreviewFetcher {
    client: reqwest::Client,
}

impl PreviewFetcher {
    fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Best-effort preview; network or parse failures yield an empty one.
    pub async fn fetch_preview(&self, url: &str) -> PagePreview {
        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{url}")
        };

        let html = match self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, random_user_agent())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(html) => html,
                Err(e) => {
                    debug!(url = %url, error = %e, "Failed to read preview body");
                    return PagePreview::default();
                }
            },
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Preview fetch returned error status");
                return PagePreview::default();
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Preview fetch failed");
                return PagePreview::default();
            }
        };

        extract_preview(&html)
    }
}

fn extract_preview(html: &str) -> PagePreview {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_default();

    let image = Selector::parse(r#"meta[property="og:image"]"#)
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(|c| c.to_string())
        })
        .unwrap_or_default();

    PagePreview { title, image }
}

// =============================================================================
// Fan-out
// =============================================================================

/// The configured source set plus the preview fetcher, run as one fan-out.
pub struct RelatedPostSources {
    sources: Vec<Arc<dyn RelatedPostSource>>,
    retry_policy: RetryPolicy,
    preview: PreviewFetcher,
}

impl RelatedPostSources {
    /// Build the production source set (Reddit, Hacker News, Medium).
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SOURCE_TIMEOUT)
            .build()?;

        let sources: Vec<Arc<dyn RelatedPostSource>> = vec![
            Arc::new(RedditSource {
                client: client.clone(),
            }),
            Arc::new(HackerNewsSource {
                client: client.clone(),
            }),
            Arc::new(MediumSource {
                client: client.clone(),
            }),
        ];

        Ok(Self {
            sources,
            retry_policy: RetryPolicy::default(),
            preview: PreviewFetcher::new(client),
        })
    }

    /// Build from explicit sources (tests, alternate configurations).
    pub fn from_sources(sources: Vec<Arc<dyn RelatedPostSource>>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SOURCE_TIMEOUT)
            .build()?;
        Ok(Self {
            sources,
            retry_policy: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(50),
            },
            preview: PreviewFetcher::new(client),
        })
    }

    /// Fetch related posts for one keyword from every source concurrently.
    ///
    /// Sources degrade independently; posts without an image then get a
    /// second concurrent pass through the preview fetcher.
    pub async fn fetch_for_keyword(&self, keyword: &str) -> Vec<RelatedPostData> {
        let fetches = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            let keyword = keyword.to_string();
            async move {
                let result = retry(
                    &self.retry_policy,
                    source.name(),
                    SourceError::is_retriable,
                    || {
                        let source = Arc::clone(&source);
                        let keyword = keyword.clone();
                        async move { source.fetch(&keyword).await }
                    },
                )
                .await;

                match result {
                    Ok(posts) => posts,
                    Err(e) => {
                        warn!(source = source.name(), keyword = %keyword, error = %e, "Source fetch degraded to empty");
                        vec![]
                    }
                }
            }
        });

        let mut posts: Vec<RelatedPostData> =
            join_all(fetches).await.into_iter().flatten().collect();

        // Fill missing images from page previews, also concurrently.
        let preview_fetches: Vec<_> = posts
            .iter()
            .enumerate()
            .filter(|(_, post)| post.image.is_empty() && !post.link.is_empty())
            .map(|(idx, post)| {
                let link = post.link.clone();
                async move { (idx, self.preview.fetch_preview(&link).await) }
            })
            .collect();

        for (idx, preview) in join_all(preview_fetches).await {
            if !preview.image.is_empty() {
                posts[idx].image = preview.image;
            }
        }

        posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource {
        posts: Vec<RelatedPostData>,
    }

    #[async_trait]
    impl RelatedPostSource for StaticSource {
        fn name(&self) -> &'static str {
            "Static"
        }
        async fn fetch(&self, _keyword: &str) -> Result<Vec<RelatedPostData>, SourceError> {
            Ok(self.posts.clone())
        }
    }

    struct FailingSource {
        status: u16,
    }

    #[async_trait]
    impl RelatedPostSource for FailingSource {
        fn name(&self) -> &'static str {
            "Failing"
        }
        async fn fetch(&self, _keyword: &str) -> Result<Vec<RelatedPostData>, SourceError> {
            Err(SourceError::Status(self.status))
        }
    }

    fn post(title: &str) -> RelatedPostData {
        RelatedPostData {
            title: title.to_string(),
            link: String::new(),
            source: "Static".to_string(),
            image: "http://img".to_string(),
        }
    }

    #[test]
    fn test_source_error_classification() {
        assert!(SourceError::Status(503).is_retriable());
        assert!(SourceError::Network("reset".into()).is_retriable());
        assert!(!SourceError::Status(422).is_retriable());
        assert!(!SourceError::Payload("not json".into()).is_retriable());
    }

    #[test]
    fn test_extract_preview_title_and_og_image() {
        let html = r#"<html><head><title> My Page </title>
            <meta property="og:image" content="https://example.com/pic.png">
            </head><body></body></html>"#;
        let preview = extract_preview(html);
        assert_eq!(preview.title, "My Page");
        assert_eq!(preview.image, "https://example.com/pic.png");
    }

    #[test]
    fn test_extract_preview_missing_pieces() {
        let preview = extract_preview("<html><body>nothing here</body></html>");
        assert_eq!(preview.title, "");
        assert_eq!(preview.image, "");
    }

    #[test]
    fn test_img_src_regex_matches_first_image() {
        let content = r#"<p>x</p><img width="5" src="https://a/b.png"><img src="https://c/d.png">"#;
        let caps = IMG_SRC.captures(content).unwrap();
        assert_eq!(&caps[1], "https://a/b.png");
    }

    #[tokio::test]
    async fn test_fan_out_merges_all_sources() {
        let sources = RelatedPostSources::from_sources(vec![
            Arc::new(StaticSource {
                posts: vec![post("a"), post("b")],
            }),
            Arc::new(StaticSource {
                posts: vec![post("c")],
            }),
        ])
        .unwrap();

        let posts = sources.fetch_for_keyword("rust").await;
        assert_eq!(posts.len(), 3);
    }

    #[tokio::test]
    async fn test_one_failing_source_degrades_alone() {
        let sources = RelatedPostSources::from_sources(vec![
            Arc::new(FailingSource { status: 422 }),
            Arc::new(StaticSource {
                posts: vec![post("survivor")],
            }),
        ])
        .unwrap();

        let posts = sources.fetch_for_keyword("rust").await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "survivor");
    }

    #[tokio::test]
    async fn test_server_errors_still_degrade_after_retries() {
        let sources =
            RelatedPostSources::from_sources(vec![Arc::new(FailingSource { status: 503 })])
                .unwrap();
        let posts = sources.fetch_for_keyword("rust").await;
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_no_sources_yields_empty() {
        let sources = RelatedPostSources::from_sources(vec![]).unwrap();
        assert!(sources.fetch_for_keyword("rust").await.is_empty());
    }
}
