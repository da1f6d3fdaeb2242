//! Model-backed transcript analysis.
//!
//! Every helper here follows the same contract: prompt the model for a
//! strictly-JSON reply, recover structure with the resilient extractor, and
//! normalize into a typed result. A reply that cannot be recovered or fails
//! shape checks degrades to a labeled default — the pipeline keeps going
//! with whatever analysis succeeded.

use serde_json::Value;
use tracing::warn;

use super::data::{EngagementPointData, KeyInsightsData, MetricData, RephraseSuggestionData, SummaryData};
use crate::kernel::extract::extract_first_json;
use crate::kernel::gemini::is_quota_error;
use crate::kernel::raw_log::save_raw_model_reply;
use crate::kernel::traits::CompletionParams;
use crate::kernel::ServerDeps;

const ENGAGEMENT_SEGMENTS: usize = 11;

/// Ask the model for performance metrics over the transcript.
pub async fn analysis_metrics(deps: &ServerDeps, transcript: &str) -> Vec<MetricData> {
    if transcript.trim().is_empty() {
        return vec![];
    }

    let prompt = format!(
        "Return strictly valid JSON only, without markdown or extra explanation.\n\
         Analyze the following transcript content for performance metrics.\n\
         Provide the output as a JSON array of objects for four key areas, where each object \
         has 'title', 'value', 'change', and 'changeType'.\n\
         'changeType' should be 'positive', 'negative', or 'neutral'.\n\
         For 'Filler Word Count', 'positive' means lower count.\n\
         Example:\n\
         [\n\
             {{\"title\": \"Trend Score\", \"value\": \"88\", \"change\": \"+5.2%\", \"changeType\": \"positive\"}},\n\
             {{\"title\": \"Clarity Score\", \"value\": \"95%\", \"change\": \"+1.5%\", \"changeType\": \"positive\"}}\n\
         ]\n\
         Transcript:\n{transcript}"
    );

    let Some(parsed) = prompt_for_json(deps, "analysis_metrics", &prompt, 0.5, 1200).await else {
        return vec![];
    };

    let Some(items) = parsed.as_array() else {
        warn!("Expected a list of analysis metrics, got another shape");
        return vec![];
    };

    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let change_type = match str_field(item, "changeType") {
                Some(ct @ ("positive" | "negative" | "neutral")) => ct,
                _ => "neutral",
            };
            Some(MetricData {
                title: str_field(item, "title").unwrap_or("Unknown").to_string(),
                value: str_field(item, "value").unwrap_or_default().to_string(),
                change: str_field(item, "change").unwrap_or_default().to_string(),
                change_type: change_type.to_string(),
            })
            .filter(|_| !obj.is_empty())
        })
        .collect()
}

/// Ask the model for 3-5 sentences worth rewording.
pub async fn rephrase_suggestions(deps: &ServerDeps, transcript: &str) -> Vec<RephraseSuggestionData> {
    if transcript.trim().is_empty() {
        return vec![];
    }

    let prompt = format!(
        "Return strictly valid JSON only, without markdown or extra explanation.\n\
         Given the following transcript, identify 3-5 sentences that could be rephrased for \
         better clarity, conciseness, or engagement.\n\
         Provide the output as a JSON array of objects, where each object has 'original' and 'suggested'.\n\
         Example:\n\
         [\n\
             {{\"original\": \"The integration of smart grids is essential.\", \"suggested\": \"Smart grids are key.\"}}\n\
         ]\n\
         Transcript:\n{transcript}"
    );

    let Some(parsed) = prompt_for_json(deps, "rephrase_suggestions", &prompt, 0.7, 1600).await
    else {
        return vec![];
    };

    let Some(items) = parsed.as_array() else {
        warn!("Expected a list of rephrase suggestions, got another shape");
        return vec![];
    };

    items
        .iter()
        .filter_map(|item| {
            let original = str_field(item, "original")?.trim().to_string();
            let suggested = str_field(item, "suggested")?.trim().to_string();
            if original.is_empty() || suggested.is_empty() {
                return None;
            }
            Some(RephraseSuggestionData {
                original,
                suggested,
            })
        })
        .collect()
}

/// Ask the model to simulate audience engagement in 10% segments.
///
/// The chart always comes back with exactly eleven segments (0% through
/// 100%); anything the model omitted is filled at the neutral midpoint.
pub async fn engagement_chart(deps: &ServerDeps, transcript: &str) -> Vec<EngagementPointData> {
    if transcript.trim().is_empty() {
        return vec![];
    }

    let prompt = format!(
        "Return strictly valid JSON only, without markdown or extra explanation.\n\
         Simulate audience engagement percentages for a presentation based on its transcript \
         content, broken down into 10% segments.\n\
         Provide the output as a JSON array of objects, where each object has 'segment' \
         (e.g., '0%', '10%', ...) and 'engagement' (an integer from 0-100).\n\
         Ensure there are exactly 11 segments (0% to 100%).\n\
         Transcript:\n{transcript}"
    );

    let Some(parsed) = prompt_for_json(deps, "engagement_data", &prompt, 0.8, 800).await else {
        return default_engagement();
    };

    let Some(items) = parsed.as_array() else {
        warn!("Could not parse valid engagement data; returning default segments");
        return default_engagement();
    };

    // Re-key by segment label, then rebuild the full 0%..100% axis so the
    // chart is always complete even when the model drops or repeats points.
    let by_segment: std::collections::HashMap<&str, i64> = items
        .iter()
        .filter_map(|item| {
            let segment = str_field(item, "segment")?;
            let engagement = item.get("engagement")?.as_i64()?;
            Some((segment, engagement))
        })
        .collect();

    (0..ENGAGEMENT_SEGMENTS)
        .map(|i| {
            let label = format!("{}%", i * 10);
            EngagementPointData {
                engagement: by_segment.get(label.as_str()).copied().unwrap_or(50) as i32,
                segment: label,
            }
        })
        .collect()
}

fn default_engagement() -> Vec<EngagementPointData> {
    (0..ENGAGEMENT_SEGMENTS)
        .map(|i| EngagementPointData {
            segment: format!("{}%", i * 10),
            engagement: 50,
        })
        .collect()
}

/// Ask the model for the most representative keywords of the transcript.
pub async fn key_insights(deps: &ServerDeps, transcript: &str) -> KeyInsightsData {
    if transcript.trim().is_empty() {
        return KeyInsightsData {
            title: "No Insights Available".to_string(),
            points: vec![],
        };
    }

    let prompt = format!(
        "Return strictly valid JSON only, without markdown or extra explanation.\n\
         Analyze the following transcript and identify the 3-7 most important and representative \
         keywords or key phrases. These should be the core terms that best describe the main \
         topics discussed. Do not add explanations beyond the keywords themselves.\n\
         Return the output as a JSON object with 'title' (string) and 'points' (array of strings).\n\
         Transcript:\n{transcript}"
    );

    let params = CompletionParams::new(0.2, 300);
    let reply = match deps.ai.complete_turns(&[prompt], params).await {
        Ok(reply) => reply,
        Err(e) if is_quota_error(&e) => {
            warn!(error = %e, "Quota exceeded while generating key insights");
            save_raw_model_reply(deps.raw_log_dir.as_deref(), "key_insights_error", &e.to_string())
                .await;
            return KeyInsightsData {
                title: "AI Quota Exceeded".to_string(),
                points: vec![e.to_string()],
            };
        }
        Err(e) => {
            warn!(error = %e, "Key insights generation failed");
            return KeyInsightsData {
                title: "Insights Generation Failed".to_string(),
                points: vec!["Could not parse insights from AI.".to_string()],
            };
        }
    };

    match extract_first_json(&reply) {
        Some(parsed) if parsed.get("title").is_some() && parsed.get("points").is_some() => {
            KeyInsightsData {
                title: str_field(&parsed, "title").unwrap_or("Insights").to_string(),
                points: string_array(&parsed, "points"),
            }
        }
        _ => {
            warn!("Insights reply malformed; expected 'title' and 'points'");
            save_raw_model_reply(deps.raw_log_dir.as_deref(), "key_insights", &reply).await;
            KeyInsightsData {
                title: "Insights Generation Failed".to_string(),
                points: vec!["Could not parse insights from AI.".to_string()],
            }
        }
    }
}

/// Ask the model for a structured summary of the transcript.
pub async fn structured_summary(deps: &ServerDeps, transcript: &str) -> SummaryData {
    if transcript.trim().is_empty() {
        return SummaryData {
            title: "No Summary Available".to_string(),
            subheader: String::new(),
            points: vec![],
        };
    }

    let prompt = format!(
        "Return strictly valid JSON only, without markdown or extra explanation.\n\
         Create a detailed summary of the following transcript.\n\
         The summary should be structured as a JSON object with a main \"title\", a concise \
         \"subheader\", and a \"points\" array containing 3-5 key bullet points.\n\
         Focus on the main themes, key arguments, and significant conclusions.\n\
         Transcript:\n{transcript}"
    );

    let params = CompletionParams::new(0.5, 1200);
    let reply = match deps.ai.complete_turns(&[prompt], params).await {
        Ok(reply) => reply,
        Err(e) if is_quota_error(&e) => {
            warn!(error = %e, "Quota exceeded while generating summary");
            save_raw_model_reply(deps.raw_log_dir.as_deref(), "summary_error", &e.to_string())
                .await;
            return SummaryData {
                title: "AI Quota Exceeded".to_string(),
                subheader: e.to_string(),
                points: vec![],
            };
        }
        Err(e) => {
            warn!(error = %e, "Summary generation failed");
            return SummaryData {
                title: "Summary Generation Failed".to_string(),
                subheader: "Could not parse summary from AI.".to_string(),
                points: vec![],
            };
        }
    };

    match extract_first_json(&reply) {
        Some(parsed) if parsed.is_object() => SummaryData {
            title: str_field(&parsed, "title")
                .unwrap_or("Summary Generation Failed")
                .to_string(),
            subheader: str_field(&parsed, "subheader").unwrap_or_default().to_string(),
            points: string_array(&parsed, "points"),
        },
        _ => {
            warn!("Could not extract a summary object from the reply");
            save_raw_model_reply(deps.raw_log_dir.as_deref(), "summary", &reply).await;
            SummaryData {
                title: "Summary Generation Failed".to_string(),
                subheader: "Could not parse summary from AI.".to_string(),
                points: vec![],
            }
        }
    }
}

/// Deterministic top-terms extraction.
///
/// Lowercases, strips punctuation, drops stopwords and short tokens, then
/// ranks by frequency with lexical order breaking ties. No model involved,
/// so quick insights stay available when the API is down.
pub fn top_terms(transcript: &str, top_n: usize) -> Vec<String> {
    // Minimal stopword set; enough to keep function words out of the top.
    const STOPWORDS: &[&str] = &[
        "the", "and", "is", "in", "to", "a", "of", "it", "that", "this", "for", "on", "with",
        "as", "are", "was", "but", "be", "by", "an", "or", "from", "at", "we", "you", "i",
        "they", "he", "she", "them", "his", "her",
    ];

    if transcript.trim().is_empty() {
        return vec![];
    }

    let lowered = transcript.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    let mut freqs: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for token in cleaned.split_whitespace() {
        if token.len() < 3 || token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if STOPWORDS.contains(&token) {
            continue;
        }
        *freqs.entry(token).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = freqs.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(term, _)| term.to_string())
        .collect()
}

/// Prompt, recover JSON, and dump the raw reply on failure.
async fn prompt_for_json(
    deps: &ServerDeps,
    helper_name: &str,
    prompt: &str,
    temperature: f64,
    max_output_tokens: u32,
) -> Option<Value> {
    let params = CompletionParams::new(temperature, max_output_tokens);
    let reply = match deps.ai.complete_turns(&[prompt.to_string()], params).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(helper = helper_name, error = %e, "Model call failed");
            save_raw_model_reply(
                deps.raw_log_dir.as_deref(),
                &format!("{helper_name}_error"),
                &e.to_string(),
            )
            .await;
            return None;
        }
    };

    match extract_first_json(&reply) {
        Some(value) => Some(value),
        None => {
            warn!(helper = helper_name, "Could not recover JSON from model reply");
            save_raw_model_reply(deps.raw_log_dir.as_deref(), helper_name, &reply).await;
            None
        }
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(|v| v.as_str())
}

fn string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|p| match p.as_str() {
                    Some(s) => s.to_string(),
                    None => p.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::test_deps;

    #[test]
    fn test_top_terms_ranks_by_frequency() {
        let text = "Rust makes systems programming safe. Rust programs are fast, and Rust tooling is great.";
        let terms = top_terms(text, 3);
        assert_eq!(terms[0], "rust");
        assert_eq!(terms.len(), 3);
    }

    #[test]
    fn test_top_terms_skips_stopwords_and_short_tokens() {
        let terms = top_terms("the and is to of it ab cd", 10);
        assert!(terms.is_empty());
    }

    #[test]
    fn test_top_terms_ties_break_lexically() {
        let terms = top_terms("banana apple", 2);
        assert_eq!(terms, vec!["apple", "banana"]);
    }

    #[test]
    fn test_top_terms_empty_input() {
        assert!(top_terms("", 10).is_empty());
        assert!(top_terms("   ", 10).is_empty());
    }

    #[tokio::test]
    async fn test_metrics_normalizes_and_sanitizes() {
        let deps = test_deps(vec![
            r#"```json
            [
                {"title": "Trend Score", "value": "88", "change": "+5.2%", "changeType": "positive"},
                {"title": "Odd", "value": "1", "change": "0", "changeType": "sideways"}
            ]
            ```"#,
        ]);
        let metrics = analysis_metrics(&deps, "some transcript").await;
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].change_type, "positive");
        // Unknown changeType collapses to neutral.
        assert_eq!(metrics[1].change_type, "neutral");
    }

    #[tokio::test]
    async fn test_metrics_empty_transcript_short_circuits() {
        let deps = test_deps(vec![]);
        assert!(analysis_metrics(&deps, "  ").await.is_empty());
    }

    #[tokio::test]
    async fn test_metrics_unparseable_reply_degrades() {
        let deps = test_deps(vec!["I could not produce metrics, sorry."]);
        assert!(analysis_metrics(&deps, "transcript").await.is_empty());
    }

    #[tokio::test]
    async fn test_rephrase_drops_incomplete_pairs() {
        let deps = test_deps(vec![
            r#"[{"original": "a", "suggested": "b"}, {"original": "", "suggested": "x"}, {"original": "c"}]"#,
        ]);
        let suggestions = rephrase_suggestions(&deps, "transcript").await;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].original, "a");
    }

    #[tokio::test]
    async fn test_engagement_fills_missing_segments() {
        let deps = test_deps(vec![
            r#"[{"segment": "0%", "engagement": 65}, {"segment": "50%", "engagement": 80}]"#,
        ]);
        let chart = engagement_chart(&deps, "transcript").await;
        assert_eq!(chart.len(), 11);
        assert_eq!(chart[0].engagement, 65);
        assert_eq!(chart[5].engagement, 80);
        assert_eq!(chart[1].engagement, 50);
    }

    #[tokio::test]
    async fn test_engagement_defaults_on_model_failure() {
        let deps = test_deps(vec![]); // script exhausted -> error
        let chart = engagement_chart(&deps, "transcript").await;
        assert_eq!(chart.len(), 11);
        assert!(chart.iter().all(|p| p.engagement == 50));
    }

    #[tokio::test]
    async fn test_key_insights_happy_path() {
        let deps = test_deps(vec![
            r#"{"title": "Key Transcript Keywords", "points": ["TCS", "Placements"]}"#,
        ]);
        let insights = key_insights(&deps, "transcript").await;
        assert_eq!(insights.title, "Key Transcript Keywords");
        assert_eq!(insights.points, vec!["TCS", "Placements"]);
    }

    #[tokio::test]
    async fn test_key_insights_malformed_reply() {
        let deps = test_deps(vec![r#"{"something": "else"}"#]);
        let insights = key_insights(&deps, "transcript").await;
        assert_eq!(insights.title, "Insights Generation Failed");
    }

    #[tokio::test]
    async fn test_summary_truncated_reply_recovers() {
        // Reply cut off mid-array: the extractor closes it and the summary
        // keeps the recovered points.
        let deps = test_deps(vec![
            r#"{"title": "Takeaways", "subheader": "Overview", "points": ["Solar", "Wind""#,
        ]);
        let summary = structured_summary(&deps, "transcript").await;
        assert_eq!(summary.title, "Takeaways");
        assert_eq!(summary.points, vec!["Solar", "Wind"]);
    }

    #[tokio::test]
    async fn test_summary_empty_transcript() {
        let deps = test_deps(vec![]);
        let summary = structured_summary(&deps, "").await;
        assert_eq!(summary.title, "No Summary Available");
    }
}
