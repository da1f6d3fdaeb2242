//! SEO dashboard actions.
//!
//! `send_chat_message` is the two-part mutation: the fast path prompts the
//! model for dashboard data, recovers its JSON reply, and returns normalized
//! keywords immediately; the slow path (related-post enrichment across
//! external sources) runs as a background job the client polls by id.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::data::{
    ChatResponseWithJob, CoreDashboardData, DetailedJobResult, KeywordData, KeywordRelatedPosts,
    PlatformTrendData, RecentGenerationData,
};
use super::sources::RelatedPostSources;
use super::store::DashboardState;
use crate::kernel::extract::extract_first_json;
use crate::kernel::jobs::{JobId, JobRegistry, JobStatus};
use crate::kernel::raw_log::save_raw_model_reply;
use crate::kernel::traits::CompletionParams;
use crate::kernel::ServerDeps;

const MAX_KEYWORDS: usize = 10;

/// Plausible 7-day trend series with bounded day-to-day movement.
pub fn generate_dynamic_trend(
    start_value: i32,
    num_days: usize,
    volatility: i32,
    min_val: i32,
    max_val: i32,
) -> Vec<i32> {
    let mut trend = vec![start_value];
    for _ in 1..num_days {
        let change = fastrand::i32(-volatility..=volatility);
        let next = (trend[trend.len() - 1] + change).clamp(min_val, max_val);
        trend.push(next);
    }
    trend
}

/// Deterministic per-platform scores derived from the keyword itself, used
/// when the model omits a keyword's platform trends.
pub fn platform_trends_for(keyword: &str) -> Vec<PlatformTrendData> {
    let hash: i32 = keyword
        .to_lowercase()
        .chars()
        .map(|c| c as i32)
        .sum();

    vec![
        PlatformTrendData {
            platform: "Blog".to_string(),
            score: 60 + hash % 40,
        },
        PlatformTrendData {
            platform: "YouTube".to_string(),
            score: 50 + hash % 50,
        },
        PlatformTrendData {
            platform: "Twitter".to_string(),
            score: 40 + hash % 60,
        },
        PlatformTrendData {
            platform: "LinkedIn".to_string(),
            score: 55 + hash % 45,
        },
    ]
}

fn dashboard_prompt(context: &str, message: &str) -> String {
    format!(
        "You are an expert SEO content strategist. Based on the user's input and context, \
         provide highly relevant SEO dashboard data. Return your response as a single JSON \
         object. The structure MUST be exactly as follows:\n\
         ```json\n\
         {{\n\
           \"dashboard_data\": {{\n\
             \"primary_keyword\": \"<ONE primary trending SEO keyword, CamelCase, no spaces or \
         special characters, under 25 characters>\",\n\
             \"related_keywords\": [\"<related_keyword_1>\", ... (up to 9 more)],\n\
             \"keywords_info\": [\n\
               {{\"name\": \"<keyword_name>\", \"traffic\": <integer, 1000-150000>, \
         \"prev_traffic\": <integer, +/-20% of traffic>, \"trend\": [<7 ints, 20-100>], \
         \"suggestions\": [\"<suggestion_1>\", \"<suggestion_2>\", \"<suggestion_3>\"]}}\n\
             ],\n\
             \"platform_trends_map\": [\n\
               [{{\"platform\": \"Blog\", \"score\": <int>}}, {{\"platform\": \"YouTube\", \
         \"score\": <int>}}, {{\"platform\": \"Twitter\", \"score\": <int>}}, \
         {{\"platform\": \"LinkedIn\", \"score\": <int>}}]\n\
             ]\n\
           }}\n\
         }}\n\
         ```\n\
         Ensure all placeholder values are replaced with realistic but fictional data relevant \
         to the keywords. The platform_trends_map should contain one trends array for each \
         keyword in keywords_info, in the same order. Do not include any other text outside \
         the JSON block.\n\n\
         Context for Analysis: {context}\n\
         User Query: {message}\n\
         Begin your JSON response now:"
    )
}

/// Keyword data recovered and cleaned from the model's dashboard reply.
pub struct NormalizedDashboard {
    pub primary_keyword: Option<String>,
    pub keywords: Vec<KeywordData>,
    pub platform_trends: Vec<Vec<PlatformTrendData>>,
}

/// Normalize the parsed dashboard reply: dedupe keyword names
/// case-insensitively, cap the list, and backfill anything the model
/// omitted with generated data.
pub fn normalize_dashboard(parsed: &Value) -> NormalizedDashboard {
    let section = parsed.get("dashboard_data").cloned().unwrap_or(Value::Null);

    let primary_keyword = section
        .get("primary_keyword")
        .and_then(|v| v.as_str())
        .map(String::from);

    let mut names: Vec<String> = Vec::new();
    if let Some(primary) = &primary_keyword {
        names.push(primary.clone());
    }
    if let Some(related) = section.get("related_keywords").and_then(|v| v.as_array()) {
        for value in related {
            if let Some(name) = value.as_str() {
                if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                    names.push(name.to_string());
                }
            }
        }
    }
    names.truncate(MAX_KEYWORDS);

    let info_list = section
        .get("keywords_info")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let trends_list = section
        .get("platform_trends_map")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut keywords = Vec::new();
    let mut platform_trends = Vec::new();

    for (i, name) in names.iter().enumerate() {
        let info = info_list.iter().find(|item| {
            item.get("name")
                .and_then(|n| n.as_str())
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false)
        });

        let keyword = match info {
            Some(info) => KeywordData {
                id: Uuid::new_v4().to_string(),
                name: info
                    .get("name")
                    .and_then(|n| n.as_str())
                    .unwrap_or(name)
                    .to_string(),
                traffic: int_field(info, "traffic"),
                prev_traffic: int_field(info, "prev_traffic"),
                trend: int_array(info, "trend"),
                suggestions: string_array(info, "suggestions"),
            },
            None => {
                warn!(keyword = %name, "Model omitted keyword details; generating fallback data");
                KeywordData {
                    id: Uuid::new_v4().to_string(),
                    name: name.clone(),
                    traffic: fastrand::i32(1000..=11000),
                    prev_traffic: fastrand::i32(500..=9500),
                    trend: generate_dynamic_trend(
                        fastrand::i32(40..=70),
                        7,
                        fastrand::i32(10..=25),
                        10,
                        95,
                    ),
                    suggestions: vec![format!("{name} analysis"), format!("{name} guide")],
                }
            }
        };
        keywords.push(keyword);

        let trends = trends_list
            .get(i)
            .and_then(|v| serde_json::from_value::<Vec<PlatformTrendData>>(v.clone()).ok())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| platform_trends_for(name));
        platform_trends.push(trends);
    }

    NormalizedDashboard {
        primary_keyword,
        keywords,
        platform_trends,
    }
}

/// Handle one dashboard chat message: fast model-backed keyword data plus a
/// background job for related-post enrichment.
pub async fn send_chat_message(
    deps: &ServerDeps,
    dashboard: &Arc<DashboardState>,
    sources: &Arc<RelatedPostSources>,
    message: &str,
    uploaded_transcripts: Option<Vec<String>>,
    uploaded_files: Option<Vec<String>>,
    youtube_url_info: Option<String>,
) -> Result<ChatResponseWithJob> {
    let job_id = deps.jobs.submit();

    match send_chat_message_inner(
        deps,
        dashboard,
        message,
        &uploaded_transcripts,
        &uploaded_files,
        &youtube_url_info,
    )
    .await
    {
        Ok((initial_data, keyword_names)) => {
            spawn_enrichment(
                job_id,
                keyword_names,
                deps.jobs.clone(),
                dashboard.clone(),
                sources.clone(),
            );
            record_generation(dashboard, message, &uploaded_transcripts, &uploaded_files, &youtube_url_info);
            Ok(ChatResponseWithJob {
                initial_data: Some(initial_data),
                job_id: job_id.to_string(),
            })
        }
        Err(e) => {
            if let Err(job_err) = deps.jobs.fail(job_id) {
                warn!(error = %job_err, "Could not mark dashboard job failed");
            }
            Err(e)
        }
    }
}

async fn send_chat_message_inner(
    deps: &ServerDeps,
    dashboard: &Arc<DashboardState>,
    message: &str,
    uploaded_transcripts: &Option<Vec<String>>,
    uploaded_files: &Option<Vec<String>>,
    youtube_url_info: &Option<String>,
) -> Result<(CoreDashboardData, Vec<String>)> {
    let mut context_parts = Vec::new();
    if !message.trim().is_empty() {
        context_parts.push(format!("User query: {}", message.trim()));
    }
    for (i, content) in uploaded_transcripts.iter().flatten().enumerate() {
        context_parts.push(format!("Transcript {} content: {}", i + 1, content.trim()));
    }
    for (i, content) in uploaded_files.iter().flatten().enumerate() {
        context_parts.push(format!("File {} content: {}", i + 1, content.trim()));
    }
    if let Some(info) = youtube_url_info {
        context_parts.push(format!("YouTube video analysis request: {info}"));
    }
    let combined = if context_parts.is_empty() {
        "User provided no specific content.".to_string()
    } else {
        context_parts.join("\n\n")
    };

    let prompt = dashboard_prompt(&combined, message);
    let reply = deps
        .ai
        .complete_turns(&[prompt], CompletionParams::new(0.7, 2000))
        .await?;

    let Some(parsed) = extract_first_json(&reply) else {
        error!("Dashboard reply carried no recoverable JSON");
        save_raw_model_reply(deps.raw_log_dir.as_deref(), "dashboard", &reply).await;
        anyhow::bail!("AI response format error: no JSON found in reply");
    };

    let normalized = normalize_dashboard(&parsed);
    if normalized.keywords.is_empty() {
        error!("Dashboard reply parsed but held no keywords");
        save_raw_model_reply(deps.raw_log_dir.as_deref(), "dashboard", &reply).await;
        anyhow::bail!("AI response format error: no keywords in reply");
    }

    let keyword_names: Vec<String> = normalized.keywords.iter().map(|k| k.name.clone()).collect();

    dashboard.replace_dashboard(
        normalized.keywords.clone(),
        keyword_names
            .iter()
            .cloned()
            .zip(normalized.platform_trends.iter().cloned())
            .collect(),
    );

    Ok((
        CoreDashboardData {
            keywords_data: normalized.keywords,
            platform_trends_map: normalized.platform_trends,
            primary_keyword_name: normalized.primary_keyword,
        },
        keyword_names,
    ))
}

/// Launch the related-post enrichment for a submitted job.
///
/// Cached keywords skip the fan-out; fresh results land in both the
/// dashboard store and the cache before the job completes.
fn spawn_enrichment(
    job_id: JobId,
    keywords: Vec<String>,
    jobs: JobRegistry,
    dashboard: Arc<DashboardState>,
    sources: Arc<RelatedPostSources>,
) {
    tokio::spawn(async move {
        let outcome: Result<Value> = async {
            for keyword in &keywords {
                let posts = match dashboard.cached_posts(keyword) {
                    Some(cached) => cached,
                    None => {
                        let fetched = sources.fetch_for_keyword(keyword).await;
                        dashboard.cache_posts(keyword, fetched.clone());
                        fetched
                    }
                };
                dashboard.set_related_posts(keyword, posts);
            }
            let map = dashboard.related_posts_map(&keywords);
            Ok(serde_json::to_value(map)?)
        }
        .await;

        match outcome {
            Ok(payload) => {
                info!(%job_id, "Related-post enrichment complete");
                if let Err(e) = jobs.complete(job_id, payload) {
                    warn!(%job_id, error = %e, "Could not complete enrichment job");
                }
            }
            Err(e) => {
                error!(%job_id, error = %e, "Related-post enrichment failed");
                if let Err(job_err) = jobs.fail(job_id) {
                    warn!(%job_id, error = %job_err, "Could not mark enrichment job failed");
                }
            }
        }
    });
}

fn record_generation(
    dashboard: &Arc<DashboardState>,
    message: &str,
    uploaded_transcripts: &Option<Vec<String>>,
    uploaded_files: &Option<Vec<String>>,
    youtube_url_info: &Option<String>,
) {
    let (kind, name) = if let Some(transcripts) = uploaded_transcripts.as_ref().filter(|t| !t.is_empty())
    {
        ("transcript", format!("Transcripts ({})", transcripts.len()))
    } else if let Some(files) = uploaded_files.as_ref().filter(|f| !f.is_empty()) {
        ("file", format!("Files ({})", files.len()))
    } else if let Some(info) = youtube_url_info {
        let name = serde_json::from_str::<Value>(info)
            .ok()
            .and_then(|v| v.get("name").and_then(|n| n.as_str()).map(String::from))
            .unwrap_or_else(|| "YouTube Video".to_string());
        ("youtube", name)
    } else {
        let mut name: String = message.chars().take(30).collect();
        if message.chars().count() > 30 {
            name.push_str("...");
        }
        ("chat", name)
    };

    let now_ms = chrono::Utc::now().timestamp_millis();
    dashboard.record_generation(RecentGenerationData {
        id: format!("{kind}_{}", now_ms / 1000),
        timestamp: now_ms as f64,
        kind: kind.to_string(),
        name,
    });
}

/// Current state of an enrichment job for the polling query.
pub fn detailed_job_result(jobs: &JobRegistry, job_id: JobId) -> DetailedJobResult {
    let snapshot = jobs.get(job_id);
    let related_posts_map = match (snapshot.status, snapshot.payload) {
        (JobStatus::Completed, Some(payload)) => {
            serde_json::from_value::<Vec<KeywordRelatedPosts>>(payload).unwrap_or_default()
        }
        _ => vec![],
    };

    DetailedJobResult {
        job_id: job_id.to_string(),
        status: snapshot.status.as_str().to_string(),
        related_posts_map,
    }
}

fn int_field(value: &Value, key: &str) -> i32 {
    value.get(key).and_then(|v| v.as_i64()).unwrap_or(0) as i32
}

fn int_array(value: &Value, key: &str) -> Vec<i32> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|v| v.as_i64()).map(|v| v as i32).collect())
        .unwrap_or_default()
}

fn string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::test_deps;
    use serde_json::json;
    use std::time::Duration;

    fn dashboard_reply() -> String {
        json!({
            "dashboard_data": {
                "primary_keyword": "RustAsync",
                "related_keywords": ["rustasync", "TokioRuntime"],
                "keywords_info": [
                    {
                        "name": "RustAsync",
                        "traffic": 12000,
                        "prev_traffic": 11000,
                        "trend": [40, 50, 45, 60, 70, 65, 80],
                        "suggestions": ["rust async book", "async await rust"]
                    }
                ],
                "platform_trends_map": [
                    [{"platform": "Blog", "score": 90}]
                ]
            }
        })
        .to_string()
    }

    #[test]
    fn test_normalize_dedupes_case_insensitively() {
        let parsed: Value = serde_json::from_str(&dashboard_reply()).unwrap();
        let normalized = normalize_dashboard(&parsed);
        // "rustasync" collapses into the primary keyword.
        assert_eq!(normalized.keywords.len(), 2);
        assert_eq!(normalized.keywords[0].name, "RustAsync");
        assert_eq!(normalized.keywords[1].name, "TokioRuntime");
    }

    #[test]
    fn test_normalize_uses_model_details_when_present() {
        let parsed: Value = serde_json::from_str(&dashboard_reply()).unwrap();
        let normalized = normalize_dashboard(&parsed);
        assert_eq!(normalized.keywords[0].traffic, 12000);
        assert_eq!(normalized.keywords[0].trend.len(), 7);
        assert_eq!(normalized.platform_trends[0][0].score, 90);
    }

    #[test]
    fn test_normalize_backfills_missing_details() {
        let parsed: Value = serde_json::from_str(&dashboard_reply()).unwrap();
        let normalized = normalize_dashboard(&parsed);
        // TokioRuntime has no keywords_info entry or trends.
        let fallback = &normalized.keywords[1];
        assert!(fallback.traffic >= 1000);
        assert_eq!(fallback.trend.len(), 7);
        assert_eq!(
            fallback.suggestions,
            vec!["TokioRuntime analysis", "TokioRuntime guide"]
        );
        assert_eq!(normalized.platform_trends[1].len(), 4);
    }

    #[test]
    fn test_normalize_empty_reply() {
        let normalized = normalize_dashboard(&json!({}));
        assert!(normalized.keywords.is_empty());
        assert!(normalized.primary_keyword.is_none());
    }

    #[test]
    fn test_dynamic_trend_stays_in_bounds() {
        let trend = generate_dynamic_trend(50, 7, 20, 0, 100);
        assert_eq!(trend.len(), 7);
        assert!(trend.iter().all(|v| (0..=100).contains(v)));
        // Consecutive days never move more than the volatility.
        for pair in trend.windows(2) {
            assert!((pair[1] - pair[0]).abs() <= 20);
        }
    }

    #[test]
    fn test_platform_trends_are_deterministic() {
        assert_eq!(platform_trends_for("rust"), platform_trends_for("rust"));
        assert_eq!(platform_trends_for("rust").len(), 4);
    }

    #[tokio::test]
    async fn test_send_chat_message_full_cycle() {
        let deps = test_deps(vec![&dashboard_reply()]);
        let dashboard = Arc::new(DashboardState::new());
        let sources = Arc::new(RelatedPostSources::from_sources(vec![]).unwrap());

        let response = send_chat_message(
            &deps,
            &dashboard,
            &sources,
            "what's trending in rust?",
            None,
            None,
            None,
        )
        .await
        .unwrap();

        let initial = response.initial_data.unwrap();
        assert_eq!(initial.primary_keyword_name.as_deref(), Some("RustAsync"));
        assert_eq!(initial.keywords_data.len(), 2);

        // The dashboard store was replaced.
        assert_eq!(dashboard.all_dashboard_data().keywords.len(), 2);
        let generations = dashboard.recent_generations();
        assert_eq!(generations.len(), 1);
        assert_eq!(generations[0].kind, "chat");

        // The enrichment job completes in the background (no sources
        // configured, so it finishes with empty posts per keyword).
        let job_id: JobId = response.job_id.parse().unwrap();
        let mut status = JobStatus::Pending;
        for _ in 0..50 {
            status = deps.jobs.get(job_id).status;
            if status != JobStatus::Pending {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, JobStatus::Completed);

        let result = detailed_job_result(&deps.jobs, job_id);
        assert_eq!(result.status, "COMPLETED");
        assert_eq!(result.related_posts_map.len(), 2);
        assert!(result.related_posts_map.iter().all(|m| m.posts.is_empty()));
    }

    #[tokio::test]
    async fn test_send_chat_message_unparseable_reply_fails_job() {
        let deps = test_deps(vec!["I refuse to answer in JSON."]);
        let dashboard = Arc::new(DashboardState::new());
        let sources = Arc::new(RelatedPostSources::from_sources(vec![]).unwrap());

        let err = send_chat_message(&deps, &dashboard, &sources, "hi", None, None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("AI response format error"));
        assert_eq!(deps.jobs.len(), 1);
    }

    #[test]
    fn test_detailed_job_result_not_found() {
        let jobs = JobRegistry::new();
        let result = detailed_job_result(&jobs, Uuid::new_v4());
        assert_eq!(result.status, "NOT_FOUND");
        assert!(result.related_posts_map.is_empty());
    }

    #[test]
    fn test_record_generation_truncates_long_messages() {
        let dashboard = Arc::new(DashboardState::new());
        let long = "x".repeat(50);
        record_generation(&dashboard, &long, &None, &None, &None);
        let generations = dashboard.recent_generations();
        assert_eq!(generations[0].name.len(), 33); // 30 chars + "..."
    }
}
