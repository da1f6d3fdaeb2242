//! GraphQL data types for transcription and analysis results.

use juniper::GraphQLObject;

/// One timed line of transcript text.
#[derive(Debug, Clone, GraphQLObject)]
pub struct TimestampData {
    pub time: f64,
    pub text: String,
}

/// A single performance metric derived from the transcript.
#[derive(Debug, Clone, GraphQLObject)]
pub struct MetricData {
    pub title: String,
    pub value: String,
    pub change: String,
    pub change_type: String,
}

/// A sentence the model suggests rewording.
#[derive(Debug, Clone, GraphQLObject)]
pub struct RephraseSuggestionData {
    pub original: String,
    pub suggested: String,
}

/// Simulated audience engagement for one tenth of the content.
#[derive(Debug, Clone, GraphQLObject)]
pub struct EngagementPointData {
    pub segment: String,
    pub engagement: i32,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct AnalysisResultData {
    pub metrics: Vec<MetricData>,
    pub rephrase_suggestions: Vec<RephraseSuggestionData>,
    pub engagement_chart_data: Vec<EngagementPointData>,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct KeyInsightsData {
    pub title: String,
    pub points: Vec<String>,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct SummaryData {
    pub title: String,
    pub subheader: String,
    pub points: Vec<String>,
}

/// Full outcome of a transcription pipeline run.
#[derive(Debug, Clone, GraphQLObject)]
pub struct TranscriptionResultData {
    pub timestamps: Vec<TimestampData>,
    pub full_transcript_content: String,
    pub analysis_data: Option<AnalysisResultData>,
    pub key_insights: Option<KeyInsightsData>,
    pub summary_content: Option<SummaryData>,
}

/// Reply to a conversational command.
#[derive(Debug, Clone, GraphQLObject)]
pub struct ChatCommandResponse {
    pub ai_chat_message: String,
    pub processed_content: String,
}

/// Outcome of standalone text analysis.
#[derive(Debug, Clone, GraphQLObject)]
pub struct AnalyzeTextResult {
    pub analysis_data: Option<AnalysisResultData>,
    pub key_insights: Option<KeyInsightsData>,
    pub summary_content: Option<SummaryData>,
}
