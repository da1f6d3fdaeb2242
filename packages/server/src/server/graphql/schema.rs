//! GraphQL schema definition.

use juniper::{EmptySubscription, FieldError, FieldResult, RootNode};
use tracing::error;
use uuid::Uuid;

use super::context::GraphQLContext;

// Domain actions
use crate::domains::posts::actions as post_actions;
use crate::domains::seo::actions as seo_actions;
use crate::domains::transcripts::chat as chat_actions;
use crate::domains::transcripts::transcribe as transcribe_actions;

// Domain data types (GraphQL types)
use crate::domains::posts::data::{DevToPostResult, GeneratePostsInput, GeneratedPostsData};
use crate::domains::seo::data::{
    self as seo_data, AllDashboardData, ChatResponseWithJob, DetailedJobResult,
    GenerationTypeBreakdownData, RecentGenerationData, TranscriptData, UserActivityTrendData,
};
use crate::domains::transcripts::data::{
    AnalyzeTextResult, ChatCommandResponse, TranscriptionResultData,
};

fn to_field_error(e: anyhow::Error) -> FieldError {
    error!(error = %e, "GraphQL resolver failed");
    FieldError::new(e.to_string(), juniper::Value::null())
}

pub struct Query;

#[juniper::graphql_object(context = GraphQLContext)]
impl Query {
    fn hello(name: Option<String>) -> String {
        format!("Hello, {}!", name.unwrap_or_else(|| "World".to_string()))
    }

    /// Full dashboard snapshot: keywords, suggestions, platform trends, and
    /// whatever related posts have been fetched so far.
    fn all_dashboard_data(ctx: &GraphQLContext) -> AllDashboardData {
        ctx.dashboard.all_dashboard_data()
    }

    /// Sample transcripts for the demo dashboard.
    fn mock_transcripts() -> Vec<TranscriptData> {
        seo_data::mock_transcripts()
    }

    fn recent_generations(ctx: &GraphQLContext) -> Vec<RecentGenerationData> {
        ctx.dashboard.recent_generations()
    }

    fn user_activity_trends() -> Vec<UserActivityTrendData> {
        seo_data::user_activity_trends()
    }

    fn generation_type_breakdown() -> Vec<GenerationTypeBreakdownData> {
        seo_data::generation_type_breakdown()
    }

    /// Poll a background enrichment job. Unknown (or malformed) ids report
    /// NOT_FOUND rather than erroring.
    fn detailed_dashboard_job_result(ctx: &GraphQLContext, job_id: String) -> DetailedJobResult {
        match job_id.parse::<Uuid>() {
            Ok(id) => seo_actions::detailed_job_result(&ctx.deps.jobs, id),
            Err(_) => DetailedJobResult {
                job_id,
                status: "NOT_FOUND".to_string(),
                related_posts_map: vec![],
            },
        }
    }
}

pub struct Mutation;

#[juniper::graphql_object(context = GraphQLContext)]
impl Mutation {
    /// Transcribe a YouTube video and run the quick-analysis phase.
    /// Progress streams to subscribers of the `progress` topic.
    async fn transcribe_video(
        ctx: &GraphQLContext,
        url: String,
    ) -> FieldResult<TranscriptionResultData> {
        transcribe_actions::transcribe_video(&ctx.deps, &url)
            .await
            .map_err(to_field_error)
    }

    /// Transcribe an uploaded file (base64 content) and run full analysis.
    async fn transcribe_file(
        ctx: &GraphQLContext,
        file_content: String,
        file_name: String,
        file_mime_type: String,
    ) -> FieldResult<TranscriptionResultData> {
        transcribe_actions::transcribe_file(&ctx.deps, &file_content, &file_name, &file_mime_type)
            .await
            .map_err(to_field_error)
    }

    /// Route a conversational command (summarize, translate, rephrase, ...)
    /// to the matching content generation. Failures come back as an
    /// apologetic chat message, not a GraphQL error.
    async fn process_chat_command(
        ctx: &GraphQLContext,
        user_message: String,
        current_transcript: Option<String>,
        youtube_url: Option<String>,
    ) -> FieldResult<ChatCommandResponse> {
        match chat_actions::orchestrate_user_request(
            &ctx.deps,
            &user_message,
            current_transcript.as_deref(),
            youtube_url.as_deref(),
        )
        .await
        {
            Ok(orchestration) => Ok(ChatCommandResponse {
                ai_chat_message: orchestration.ai_chat_message,
                processed_content: orchestration.processed_content,
            }),
            Err(e) => {
                error!(error = %e, "Chat command orchestration failed");
                Ok(ChatCommandResponse {
                    ai_chat_message: format!(
                        "I apologize, but I encountered an error while processing your \
                         request: {e}. Please try again or rephrase."
                    ),
                    processed_content: current_transcript.unwrap_or_default(),
                })
            }
        }
    }

    /// Analyze pasted text: deterministic quick insights plus a structured
    /// model summary.
    async fn analyze_text(ctx: &GraphQLContext, text: String) -> FieldResult<AnalyzeTextResult> {
        Ok(transcribe_actions::analyze_text(&ctx.deps, &text).await)
    }

    /// Generate dashboard keyword data for a chat message and kick off the
    /// related-post enrichment job.
    async fn send_chat_message(
        ctx: &GraphQLContext,
        message: String,
        uploaded_transcripts_content: Option<Vec<String>>,
        uploaded_files_content: Option<Vec<String>>,
        youtube_url_info: Option<String>,
    ) -> FieldResult<ChatResponseWithJob> {
        seo_actions::send_chat_message(
            &ctx.deps,
            &ctx.dashboard,
            &ctx.related_sources,
            &message,
            uploaded_transcripts_content,
            uploaded_files_content,
            youtube_url_info,
        )
        .await
        .map_err(to_field_error)
    }

    /// Generate all four channel posts from the prompt and source material.
    async fn generate_posts(
        ctx: &GraphQLContext,
        input: GeneratePostsInput,
    ) -> FieldResult<GeneratedPostsData> {
        post_actions::generate_posts(&ctx.deps, input)
            .await
            .map_err(to_field_error)
    }

    /// Publish a blog post to Dev.to. Publish failures are reported in-band
    /// in `blogUrl` so the client can show them alongside a success URL.
    async fn post_blog_to_dev_to(
        ctx: &GraphQLContext,
        title: String,
        content: String,
        tags: Option<Vec<String>>,
        published: Option<bool>,
    ) -> FieldResult<DevToPostResult> {
        match ctx
            .devto
            .publish_article(&title, &content, tags, published.unwrap_or(true))
            .await
        {
            Ok(url) => Ok(DevToPostResult { blog_url: url }),
            Err(e) => {
                error!(error = %e, "Dev.to publish failed");
                Ok(DevToPostResult {
                    blog_url: format!("Error: {e}"),
                })
            }
        }
    }
}

pub type Schema = RootNode<'static, Query, Mutation, EmptySubscription<GraphQLContext>>;

pub fn create_schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}
