//! Conversational command orchestration.
//!
//! A user message is first classified into an intent by a low-temperature
//! model call, then routed to the matching content-generation prompt. The
//! classifier's reply is a single line like `TRANSLATE: Spanish`; parsing it
//! is pure and tested separately from the model round-trips.

use anyhow::Result;

use super::pipeline::{stage, ProgressReporter};
use crate::kernel::traits::CompletionParams;
use crate::kernel::ServerDeps;

/// What the user asked the assistant to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Summary,
    Translate(String),
    Rephrase(String),
    Keywords,
    StoryConversion(String),
    PodcastScript,
    GeneralQuestion,
    Unsupported,
}

impl Intent {
    /// Wire name of the action taken, reported back to the client.
    pub fn action(&self) -> &'static str {
        match self {
            Intent::Summary => "SUMMARY",
            Intent::Translate(_) => "TRANSLATE",
            Intent::Rephrase(_) => "REPHRASE",
            Intent::Keywords => "KEYWORDS",
            Intent::StoryConversion(_) => "STORY_CONVERSION",
            Intent::PodcastScript => "PODCAST_SCRIPT",
            Intent::GeneralQuestion => "GENERAL_QUESTION",
            Intent::Unsupported => "UNSUPPORTED_COMMAND",
        }
    }
}

/// Parse the classifier's single-line reply.
pub fn parse_intent(reply: &str) -> Intent {
    let reply = reply.trim();
    if let Some(rest) = reply.strip_prefix("TRANSLATE:") {
        return Intent::Translate(rest.trim().to_string());
    }
    if let Some(rest) = reply.strip_prefix("REPHRASE:") {
        return Intent::Rephrase(rest.trim().to_string());
    }
    if let Some(rest) = reply.strip_prefix("STORY_CONVERSION:") {
        return Intent::StoryConversion(rest.trim().to_string());
    }
    match reply {
        "SUMMARY" => Intent::Summary,
        "KEYWORDS" => Intent::Keywords,
        "PODCAST_SCRIPT" => Intent::PodcastScript,
        "GENERAL_QUESTION" => Intent::GeneralQuestion,
        _ => Intent::Unsupported,
    }
}

/// Result of orchestrating one chat command.
#[derive(Debug, Clone)]
pub struct Orchestration {
    pub action: String,
    pub ai_chat_message: String,
    pub processed_content: String,
}

/// Classify the user's message and produce the requested content.
pub async fn orchestrate_user_request(
    deps: &ServerDeps,
    user_message: &str,
    current_transcript: Option<&str>,
    youtube_url: Option<&str>,
) -> Result<Orchestration> {
    let context_description = if current_transcript.is_some() {
        "the provided text content".to_string()
    } else if let Some(url) = youtube_url {
        format!("the YouTube video at {url} (transcript not explicitly provided yet)")
    } else {
        "your request".to_string()
    };

    let intent_prompt = format!(
        "You are an AI assistant for a transcription and content modification application.\n\
         Your goal is to understand the user's request and determine if it's a general question \
         or a command to modify content. The current context is related to {context_description}.\n\n\
         Based on the user's message, classify the intent and reply with exactly one line:\n\
         - Get a summary of {context_description}: Return \"SUMMARY\".\n\
         - Translate {context_description}: Return \"TRANSLATE: [target_language]\".\n\
         - Rephrase {context_description} (e.g., make it funny, formal, simpler): \
           Return \"REPHRASE: [rephrasing_instruction]\".\n\
         - Extract keywords from {context_description}: Return \"KEYWORDS\".\n\
         - Get a story based on {context_description}: Return \"STORY_CONVERSION: [story_style]\".\n\
         - Get a podcast script based on {context_description}: Return \"PODCAST_SCRIPT\".\n\
         - Ask a general question about {context_description} or the application itself: \
           Return \"GENERAL_QUESTION\".\n\
         - If the request is unclear, a greeting, or not related to the above: \
           Return \"UNSUPPORTED_COMMAND\".\n\n\
         User message: \"{user_message}\"\n\
         Output:"
    );

    let intent_reply = deps
        .ai
        .complete_turns(&[intent_prompt], CompletionParams::new(0.1, 50))
        .await?;
    let intent = parse_intent(&intent_reply);
    tracing::debug!(intent = intent.action(), "Classified chat command");

    let reporter = ProgressReporter::new(deps.progress_hub.clone());

    let (ai_chat_message, content_prompt) = match &intent {
        Intent::Summary => (
            "Generating a summary for you. Please check the main panel.".to_string(),
            Some("Summarize the content concisely.".to_string()),
        ),
        Intent::Translate(language) => (
            format!("Translating your content to {language}. Check the main panel!"),
            Some(format!("Translate the content to {language}.")),
        ),
        Intent::Rephrase(instruction) => (
            "Rephrasing your content based on your request. Take a look at the main panel!"
                .to_string(),
            Some(format!("Rephrase the content. {instruction}.")),
        ),
        Intent::Keywords => (
            "Extracting keywords for you. They will appear in the main panel.".to_string(),
            Some(
                "Extract a list of relevant SEO keywords from the content. Provide them as a \
                 comma-separated list."
                    .to_string(),
            ),
        ),
        Intent::StoryConversion(style) => (
            format!("Converting content into a {style} story. Check the main panel!"),
            Some(format!("Convert the content into a {style} story.")),
        ),
        Intent::PodcastScript => (
            "Generating a podcast script for you. Check the main panel!".to_string(),
            Some("Create a podcast script based on the main themes and content.".to_string()),
        ),
        Intent::GeneralQuestion => {
            let question = match (current_transcript, youtube_url) {
                (Some(transcript), _) => {
                    format!("Regarding the following content:\n\n{transcript}\n\n{user_message}")
                }
                (None, Some(url)) => {
                    format!("Regarding the YouTube video at {url}, {user_message}")
                }
                (None, None) => user_message.to_string(),
            };
            let answer = deps
                .ai
                .complete_turns(&[question], CompletionParams::default())
                .await?;
            reporter
                .report(stage::COMPLETE, 100.0, "General query addressed.")
                .await;
            return Ok(Orchestration {
                action: intent.action().to_string(),
                ai_chat_message: answer,
                processed_content: String::new(),
            });
        }
        Intent::Unsupported => {
            return Ok(Orchestration {
                action: intent.action().to_string(),
                ai_chat_message: "I couldn't quite understand that. Can you please rephrase?"
                    .to_string(),
                processed_content: String::new(),
            });
        }
    };

    let status = format!("Processing {} with AI...", intent.action().to_lowercase());
    reporter.report(stage::MODEL_PROCESSING, 0.0, status).await;

    let processed_content = match (current_transcript, content_prompt) {
        (Some(transcript), Some(prompt)) => {
            let turns = [
                format!("Given the following content:\n\n{transcript}"),
                prompt,
            ];
            deps.ai
                .complete_turns(&turns, CompletionParams::new(0.7, 2000))
                .await?
        }
        _ => "Please provide content (transcript or YouTube video) to process.".to_string(),
    };

    reporter
        .report(stage::MODEL_PROCESSING, 100.0, "Content processing complete.")
        .await;
    reporter
        .report(stage::COMPLETE, 100.0, "Processing complete!")
        .await;

    Ok(Orchestration {
        action: intent.action().to_string(),
        ai_chat_message,
        processed_content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::test_deps;

    #[test]
    fn test_parse_plain_intents() {
        assert_eq!(parse_intent("SUMMARY"), Intent::Summary);
        assert_eq!(parse_intent("KEYWORDS"), Intent::Keywords);
        assert_eq!(parse_intent("PODCAST_SCRIPT"), Intent::PodcastScript);
        assert_eq!(parse_intent("GENERAL_QUESTION"), Intent::GeneralQuestion);
        assert_eq!(parse_intent("UNSUPPORTED_COMMAND"), Intent::Unsupported);
    }

    #[test]
    fn test_parse_parameterized_intents() {
        assert_eq!(
            parse_intent("TRANSLATE: Spanish"),
            Intent::Translate("Spanish".to_string())
        );
        assert_eq!(
            parse_intent("REPHRASE: make it funny and engaging"),
            Intent::Rephrase("make it funny and engaging".to_string())
        );
        assert_eq!(
            parse_intent("STORY_CONVERSION: short story"),
            Intent::StoryConversion("short story".to_string())
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        assert_eq!(parse_intent("  SUMMARY\n"), Intent::Summary);
        assert_eq!(
            parse_intent("TRANSLATE:   French  "),
            Intent::Translate("French".to_string())
        );
    }

    #[test]
    fn test_parse_unknown_is_unsupported() {
        assert_eq!(parse_intent("MAKE_COFFEE"), Intent::Unsupported);
        assert_eq!(parse_intent(""), Intent::Unsupported);
    }

    #[tokio::test]
    async fn test_orchestrate_summary_with_transcript() {
        let deps = test_deps(vec!["SUMMARY", "A concise summary."]);
        let result =
            orchestrate_user_request(&deps, "Can you summarize this?", Some("long text"), None)
                .await
                .unwrap();
        assert_eq!(result.action, "SUMMARY");
        assert_eq!(result.processed_content, "A concise summary.");
    }

    #[tokio::test]
    async fn test_orchestrate_summary_without_content() {
        let deps = test_deps(vec!["SUMMARY"]);
        let result = orchestrate_user_request(&deps, "Summarize", None, None)
            .await
            .unwrap();
        assert!(result.processed_content.starts_with("Please provide content"));
    }

    #[tokio::test]
    async fn test_orchestrate_general_question_has_no_content() {
        let deps = test_deps(vec!["GENERAL_QUESTION", "It is about Rust."]);
        let result = orchestrate_user_request(
            &deps,
            "Who is speaking in this video?",
            Some("transcript"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(result.action, "GENERAL_QUESTION");
        assert_eq!(result.ai_chat_message, "It is about Rust.");
        assert_eq!(result.processed_content, "");
    }

    #[tokio::test]
    async fn test_orchestrate_unsupported_command() {
        let deps = test_deps(vec!["UNSUPPORTED_COMMAND"]);
        let result = orchestrate_user_request(&deps, "Hi, how are you?", None, None)
            .await
            .unwrap();
        assert_eq!(result.action, "UNSUPPORTED_COMMAND");
        assert!(result.ai_chat_message.contains("rephrase"));
    }
}
