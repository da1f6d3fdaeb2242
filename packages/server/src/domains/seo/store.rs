//! Shared dashboard state.
//!
//! An explicit, instantiable store behind one lock — every read and write
//! goes through a method that takes and releases the mutex around pure map
//! access, so concurrent GraphQL readers and background enrichment writers
//! never hold it across anything blocking. A fresh instance per test keeps
//! runs isolated.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::data::{
    AllDashboardData, KeywordData, KeywordPlatformTrends, KeywordRelatedPosts, PlatformTrendData,
    RecentGenerationData, RelatedPostData, SuggestedKeywordsData,
};
use crate::kernel::cache::LookupCache;

/// External lookups for a keyword stay cached this long.
const CACHE_TTL: Duration = Duration::from_secs(3600);
const CACHE_MAX_SIZE: usize = 50;

#[derive(Default)]
struct DashboardInner {
    keywords: Vec<KeywordData>,
    suggested: Vec<SuggestedKeywordsData>,
    platform_trends: HashMap<String, Vec<PlatformTrendData>>,
    related_posts: HashMap<String, Vec<RelatedPostData>>,
    recent_generations: Vec<RecentGenerationData>,
}

/// Dashboard keyword state plus the related-post lookup cache.
pub struct DashboardState {
    inner: Mutex<DashboardInner>,
    cache: LookupCache<Vec<RelatedPostData>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(DashboardInner::default()),
            cache: LookupCache::new(CACHE_TTL, CACHE_MAX_SIZE),
        }
    }

    /// Replace the keyword view wholesale under one lock acquisition, so
    /// readers never observe a half-updated dashboard. Related posts are
    /// left in place; the enrichment job refreshes them keyword by keyword.
    pub fn replace_dashboard(
        &self,
        keywords: Vec<KeywordData>,
        platform_trends: Vec<(String, Vec<PlatformTrendData>)>,
    ) {
        let mut inner = self.lock();
        inner.suggested = keywords
            .iter()
            .map(|k| SuggestedKeywordsData {
                keyword: k.name.clone(),
                suggestions: k.suggestions.clone(),
            })
            .collect();
        inner.platform_trends = platform_trends.into_iter().collect();
        inner.keywords = keywords;
    }

    pub fn record_generation(&self, entry: RecentGenerationData) {
        self.lock().recent_generations.push(entry);
    }

    pub fn recent_generations(&self) -> Vec<RecentGenerationData> {
        self.lock().recent_generations.clone()
    }

    pub fn set_related_posts(&self, keyword: &str, posts: Vec<RelatedPostData>) {
        self.lock().related_posts.insert(keyword.to_string(), posts);
    }

    /// Related posts for the given keywords, in request order. Keywords
    /// without fetched posts yet appear with an empty list.
    pub fn related_posts_map(&self, keywords: &[String]) -> Vec<KeywordRelatedPosts> {
        let inner = self.lock();
        keywords
            .iter()
            .map(|name| KeywordRelatedPosts {
                keyword_name: name.clone(),
                posts: inner.related_posts.get(name).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// Full dashboard snapshot for the aggregate query.
    pub fn all_dashboard_data(&self) -> AllDashboardData {
        let inner = self.lock();

        let platform_trends_initial = inner
            .keywords
            .iter()
            .filter_map(|k| {
                inner
                    .platform_trends
                    .get(&k.name)
                    .map(|trends| KeywordPlatformTrends {
                        keyword_name: k.name.clone(),
                        trends: trends.clone(),
                    })
            })
            .collect();

        let related_posts_initial = inner
            .keywords
            .iter()
            .filter_map(|k| {
                inner
                    .related_posts
                    .get(&k.name)
                    .map(|posts| KeywordRelatedPosts {
                        keyword_name: k.name.clone(),
                        posts: posts.clone(),
                    })
            })
            .collect();

        AllDashboardData {
            keywords: inner.keywords.clone(),
            suggested: inner.suggested.clone(),
            platform_trends_initial,
            related_posts_initial,
        }
    }

    pub fn cached_posts(&self, keyword: &str) -> Option<Vec<RelatedPostData>> {
        self.cache.get(keyword)
    }

    pub fn cache_posts(&self, keyword: &str, posts: Vec<RelatedPostData>) {
        self.cache.insert(keyword, posts);
    }

    /// Drop expired cache entries; returns the number removed.
    pub fn prune_cache(&self) -> usize {
        self.cache.prune()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DashboardInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(name: &str) -> KeywordData {
        KeywordData {
            id: name.to_string(),
            name: name.to_string(),
            traffic: 100,
            trend: vec![1, 2, 3],
            prev_traffic: 90,
            suggestions: vec![format!("{name} guide")],
        }
    }

    #[test]
    fn test_replace_dashboard_rebuilds_suggestions() {
        let state = DashboardState::new();
        state.replace_dashboard(vec![keyword("rust")], vec![]);

        let data = state.all_dashboard_data();
        assert_eq!(data.keywords.len(), 1);
        assert_eq!(data.suggested[0].keyword, "rust");
        assert_eq!(data.suggested[0].suggestions, vec!["rust guide"]);
    }

    #[test]
    fn test_replace_keeps_existing_related_posts() {
        let state = DashboardState::new();
        state.set_related_posts(
            "rust",
            vec![RelatedPostData {
                title: "t".to_string(),
                link: "l".to_string(),
                source: "Reddit".to_string(),
                image: String::new(),
            }],
        );

        state.replace_dashboard(vec![keyword("rust")], vec![]);

        let data = state.all_dashboard_data();
        assert_eq!(data.related_posts_initial.len(), 1);
    }

    #[test]
    fn test_related_posts_map_preserves_request_order() {
        let state = DashboardState::new();
        state.set_related_posts("b", vec![]);

        let map = state.related_posts_map(&["a".to_string(), "b".to_string()]);
        assert_eq!(map[0].keyword_name, "a");
        assert!(map[0].posts.is_empty());
        assert_eq!(map[1].keyword_name, "b");
    }

    #[test]
    fn test_cache_round_trip() {
        let state = DashboardState::new();
        assert!(state.cached_posts("rust").is_none());
        state.cache_posts("rust", vec![]);
        assert_eq!(state.cached_posts("rust"), Some(vec![]));
    }
}
