//! GraphQL data types for the SEO dashboard.
//!
//! The related-post types also derive serde: completed enrichment jobs carry
//! them as the registry payload, and the polling resolver deserializes them
//! back out.

use juniper::GraphQLObject;
use serde::{Deserialize, Serialize};

/// One tracked keyword with its traffic snapshot and trend series.
#[derive(Debug, Clone, GraphQLObject)]
pub struct KeywordData {
    pub id: String,
    pub name: String,
    pub traffic: i32,
    pub trend: Vec<i32>,
    pub prev_traffic: i32,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct SuggestedKeywordsData {
    pub keyword: String,
    pub suggestions: Vec<String>,
}

/// A post fetched from an external content source.
#[derive(Debug, Clone, PartialEq, GraphQLObject, Serialize, Deserialize)]
pub struct RelatedPostData {
    pub title: String,
    pub link: String,
    pub source: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, GraphQLObject, Serialize, Deserialize)]
pub struct PlatformTrendData {
    pub platform: String,
    pub score: i32,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct KeywordPlatformTrends {
    pub keyword_name: String,
    pub trends: Vec<PlatformTrendData>,
}

#[derive(Debug, Clone, PartialEq, GraphQLObject, Serialize, Deserialize)]
pub struct KeywordRelatedPosts {
    pub keyword_name: String,
    pub posts: Vec<RelatedPostData>,
}

/// Everything the dashboard view needs in one query.
#[derive(Debug, Clone, GraphQLObject)]
pub struct AllDashboardData {
    pub keywords: Vec<KeywordData>,
    pub suggested: Vec<SuggestedKeywordsData>,
    pub platform_trends_initial: Vec<KeywordPlatformTrends>,
    pub related_posts_initial: Vec<KeywordRelatedPosts>,
}

/// The fast initial data returned directly from the chat mutation.
#[derive(Debug, Clone, GraphQLObject)]
pub struct CoreDashboardData {
    pub keywords_data: Vec<KeywordData>,
    pub platform_trends_map: Vec<Vec<PlatformTrendData>>,
    pub primary_keyword_name: Option<String>,
}

/// The slow enrichment data, polled by job id.
#[derive(Debug, Clone, GraphQLObject)]
pub struct DetailedJobResult {
    pub job_id: String,
    pub status: String,
    pub related_posts_map: Vec<KeywordRelatedPosts>,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct ChatResponseWithJob {
    pub initial_data: Option<CoreDashboardData>,
    pub job_id: String,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct TranscriptData {
    pub id: String,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct RecentGenerationData {
    pub id: String,
    pub timestamp: f64,
    #[graphql(name = "type")]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct UserActivityTrendData {
    pub name: String,
    pub interactions: i32,
    pub uploads: i32,
    pub chats: i32,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct GenerationTypeBreakdownData {
    pub name: String,
    pub value: i32,
}

/// Sample transcripts for the demo dashboard.
pub fn mock_transcripts() -> Vec<TranscriptData> {
    vec![
        TranscriptData {
            id: "t1".to_string(),
            name: "Podcast Interview with SEO Expert".to_string(),
            content: "This transcript covers an interview about keyword research and content \
                      clusters. The expert mentioned the rising interest in AI-powered content \
                      generation tools, and how search engine language-model updates are \
                      changing keyword strategies. There's a section on video SEO and short-form \
                      search."
                .to_string(),
        },
        TranscriptData {
            id: "t2".to_string(),
            name: "Webinar on Search Algorithm Updates".to_string(),
            content: "A discussion on recent changes to ranking factors, focusing on the helpful \
                      content update and its impact on niche sites. Core web vitals remain \
                      important, with a new focus on semantic search and natural language \
                      queries."
                .to_string(),
        },
        TranscriptData {
            id: "t3".to_string(),
            name: "Lecture: Future of AI in Marketing".to_string(),
            content: "Insights into how AI is transforming digital marketing strategies, from \
                      automated ad bidding to personalized customer experiences, predictive \
                      analytics for user behavior, and AI-driven content optimization."
                .to_string(),
        },
        TranscriptData {
            id: "t4".to_string(),
            name: "Q&A Session: Local SEO Strategies".to_string(),
            content: "Answers to common questions about optimizing for local search, including \
                      business profile optimization, local citations, geo-targeted content, and \
                      voice search optimization for local businesses."
                .to_string(),
        },
    ]
}

/// Sample weekly activity series for the demo dashboard.
pub fn user_activity_trends() -> Vec<UserActivityTrendData> {
    [
        ("Day 1", 10, 3, 7),
        ("Day 2", 12, 4, 8),
        ("Day 3", 8, 2, 6),
        ("Day 4", 15, 5, 10),
        ("Day 5", 11, 3, 8),
        ("Day 6", 14, 4, 10),
        ("Day 7", 16, 5, 11),
    ]
    .into_iter()
    .map(|(name, interactions, uploads, chats)| UserActivityTrendData {
        name: name.to_string(),
        interactions,
        uploads,
        chats,
    })
    .collect()
}

/// Sample generation-type split for the demo dashboard.
pub fn generation_type_breakdown() -> Vec<GenerationTypeBreakdownData> {
    [
        ("Transcripts", 20),
        ("Files", 15),
        ("YouTube", 10),
        ("Chat", 55),
    ]
    .into_iter()
    .map(|(name, value)| GenerationTypeBreakdownData {
        name: name.to_string(),
        value,
    })
    .collect()
}
