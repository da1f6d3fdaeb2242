//! Multi-channel post generation.
//!
//! One request produces a blog post, a LinkedIn post, a newsletter segment,
//! and a tweet from the same source material. The four generators run
//! concurrently; a channel whose model call fails comes back as an empty
//! string without affecting the others.

use anyhow::Result;
use tracing::warn;

use super::data::{
    resolve_options, ChannelDefaults, GeneratePostsInput, GeneratedPostsData,
    GenerationOptionsInput, ResolvedOptions,
};
use crate::domains::transcripts::transcribe::{decode_base64_payload, decode_text};
use crate::domains::transcripts::youtube;
use crate::kernel::traits::CompletionParams;
use crate::kernel::ServerDeps;

const BLOG_DEFAULTS: ChannelDefaults = ChannelDefaults {
    tone: "Informative",
    length_limit: 1000,
    length_in_words: true,
    keywords: "SEO, content creation",
    audience: "General",
    formality: 70,
    creativity: 60,
};

const LINKEDIN_DEFAULTS: ChannelDefaults = ChannelDefaults {
    tone: "Professional",
    length_limit: 600,
    length_in_words: false,
    keywords: "professional, networking",
    audience: "Professionals",
    formality: 80,
    creativity: 40,
};

const NEWSLETTER_DEFAULTS: ChannelDefaults = ChannelDefaults {
    tone: "Friendly",
    length_limit: 200,
    length_in_words: false,
    keywords: "newsletter, updates",
    audience: "Subscribers",
    formality: 60,
    creativity: 70,
};

const TWITTER_DEFAULTS: ChannelDefaults = ChannelDefaults {
    tone: "Concise",
    length_limit: 100,
    length_in_words: false,
    keywords: "trending, social",
    audience: "General",
    formality: 40,
    creativity: 80,
};

/// Generate all four channel posts for one request.
pub async fn generate_posts(
    deps: &ServerDeps,
    input: GeneratePostsInput,
) -> Result<GeneratedPostsData> {
    let sources_text = collect_content_sources(deps, &input).await?;
    let options = input.options.unwrap_or_default();

    let blog_prompt_str = blog_prompt(&input.prompt, &options, &sources_text);
    let linkedin_options =
        resolve_options(options.linkedin.as_ref(), options.all.as_ref(), &LINKEDIN_DEFAULTS);
    let linkedin_prompt_str = channel_prompt(
        "LinkedIn Post",
        "a professional and engaging LinkedIn post",
        "Include relevant hashtags at the end.",
        &input.prompt,
        &linkedin_options,
        &sources_text,
    );
    let newsletter_options =
        resolve_options(options.newsletter.as_ref(), options.all.as_ref(), &NEWSLETTER_DEFAULTS);
    let newsletter_prompt_str = channel_prompt(
        "Newsletter Segment",
        "a concise and friendly newsletter segment",
        "Include a clear subject line at the very top, formatted as 'Subject: [Your Subject Line]'.",
        &input.prompt,
        &newsletter_options,
        &sources_text,
    );
    let twitter_options =
        resolve_options(options.twitter.as_ref(), options.all.as_ref(), &TWITTER_DEFAULTS);
    let twitter_prompt_str = channel_prompt(
        "Twitter Post",
        "a brief and concise Twitter (X) post",
        "Use relevant hashtags.",
        &input.prompt,
        &twitter_options,
        &sources_text,
    );

    let (blog, linkedin, newsletter, twitter) = futures::join!(
        generate_channel(deps, "Blog", &blog_prompt_str),
        generate_channel(deps, "LinkedIn", &linkedin_prompt_str),
        generate_channel(deps, "Newsletter", &newsletter_prompt_str),
        generate_channel(deps, "Twitter", &twitter_prompt_str),
    );

    let result = GeneratedPostsData {
        blog,
        linkedin,
        newsletter,
        twitter,
    };

    if result.blog.is_empty()
        && result.linkedin.is_empty()
        && result.newsletter.is_empty()
        && result.twitter.is_empty()
    {
        anyhow::bail!("Failed to generate any content. Please check your prompt and try again.");
    }

    Ok(result)
}

/// Assemble the combined source material: selected transcripts, attached
/// file contents, and the transcript of a referenced video.
async fn collect_content_sources(deps: &ServerDeps, input: &GeneratePostsInput) -> Result<String> {
    let mut sources = String::new();

    for transcript in input.selected_transcripts.iter().flatten() {
        sources.push_str(transcript);
        sources.push_str("\n\n");
    }

    for file in input.attached_files.iter().flatten() {
        let text = parse_attached_file(deps, &file.name, &file.content).await?;
        sources.push_str(&format!(
            "--- Content from file '{}' ---\n{}\n---\n\n",
            file.name, text
        ));
    }

    if let Some(url) = &input.youtube_url {
        let video_id = youtube::extract_video_id(url)
            .ok_or_else(|| anyhow::anyhow!("Could not extract video ID from {url}"))?;
        match deps.captions.fetch(&video_id).await {
            Ok(Some(segments)) => {
                let transcript: Vec<String> =
                    segments.into_iter().map(|s| s.text).collect();
                sources.push_str(&format!(
                    "--- YouTube Video Transcript ---\n{}\n---\n",
                    transcript.join(" ")
                ));
            }
            Ok(None) => warn!(video_id, "No transcript available for referenced video"),
            Err(e) => {
                anyhow::bail!("Error fetching YouTube transcript: {e}");
            }
        }
    }

    Ok(sources)
}

async fn parse_attached_file(deps: &ServerDeps, name: &str, content: &str) -> Result<String> {
    let bytes = decode_base64_payload(content)?;
    let extension = name.rsplit('.').next().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "pdf" => deps.documents.extract(&bytes, "application/pdf").await,
        "docx" | "doc" => {
            deps.documents
                .extract(
                    &bytes,
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                )
                .await
        }
        _ => Ok(decode_text(bytes)),
    }
}

async fn generate_channel(deps: &ServerDeps, channel: &str, prompt: &str) -> String {
    match deps
        .ai
        .complete_turns(&[prompt.to_string()], CompletionParams::new(0.7, 2000))
        .await
    {
        Ok(content) => content,
        Err(e) => {
            warn!(channel, error = %e, "Channel generation failed; returning empty content");
            String::new()
        }
    }
}

fn blog_prompt(user_prompt: &str, options: &GenerationOptionsInput, sources: &str) -> String {
    let resolved = resolve_options(options.blog.as_ref(), options.all.as_ref(), &BLOG_DEFAULTS);
    channel_prompt(
        "Blog Post",
        "a compelling, high-quality blog post",
        "",
        user_prompt,
        &resolved,
        sources,
    )
}

fn channel_prompt(
    post_type: &str,
    description: &str,
    extra_constraints: &str,
    user_prompt: &str,
    options: &ResolvedOptions,
    sources: &str,
) -> String {
    let length_constraint = if options.length_in_words {
        format!("- Word Count: Up to {} words", options.length_limit)
    } else {
        format!("- Character Count: Up to {} characters", options.length_limit)
    };

    let mut constraints = vec![
        format!("- Post Type: {post_type}"),
        format!("- Language: {}", options.language),
        format!("- Tone: {}", options.tone),
        format!(
            "- Formality Level: {}% (0=very casual, 100=very formal)",
            options.formality
        ),
        format!(
            "- Creativity Level: {}% (0=very structured, 100=very creative)",
            options.creativity
        ),
        length_constraint,
        format!("- Keywords: {}", options.keywords),
        format!("- Audience: {}", options.audience),
        "- Include relevant emojis where appropriate (not like a chatbot).".to_string(),
        "- **Backlinks**: Include valid backlinks using Markdown syntax like \
         [Text to display](https://example.com). Use only main, top-level URLs so the links \
         stay reliable."
            .to_string(),
    ];
    if !extra_constraints.is_empty() {
        constraints.push(format!("- {extra_constraints}"));
    }

    format!(
        "You are a skilled content creator. Generate {description} based on the following user \
         request and source material. The post should have a humanized tone and excellent SEO.\n\n\
         Source Material:\n---\n{sources}\n---\n\n\
         User's primary request:\n---\n{user_prompt}\n---\n\n\
         Constraints:\n{}\n\n\
         Generate the full content of the {post_type}. Do not include any extra commentary.",
        constraints.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::posts::data::{AttachedFileInput, ChannelOptionsInput};
    use crate::kernel::test_dependencies::{test_deps, FixedCaptionSource, ScriptedAi};
    use crate::kernel::traits::TranscriptSegment;
    use base64::Engine as _;
    use std::sync::Arc;

    fn input(prompt: &str) -> GeneratePostsInput {
        GeneratePostsInput {
            prompt: prompt.to_string(),
            options: None,
            selected_transcripts: None,
            attached_files: None,
            youtube_url: None,
        }
    }

    #[tokio::test]
    async fn test_generates_all_four_channels() {
        let deps = test_deps(vec!["blog text", "linkedin text", "newsletter text", "tweet"]);
        let result = generate_posts(&deps, input("announce our launch")).await.unwrap();
        assert_eq!(result.blog, "blog text");
        assert_eq!(result.linkedin, "linkedin text");
        assert_eq!(result.newsletter, "newsletter text");
        assert_eq!(result.twitter, "tweet");
    }

    #[tokio::test]
    async fn test_partial_failure_degrades_that_channel() {
        // Only one scripted reply: three channels fail, one succeeds.
        let deps = test_deps(vec!["only reply"]);
        let result = generate_posts(&deps, input("x")).await.unwrap();
        let filled = [&result.blog, &result.linkedin, &result.newsletter, &result.twitter]
            .iter()
            .filter(|s| !s.is_empty())
            .count();
        assert_eq!(filled, 1);
    }

    #[tokio::test]
    async fn test_all_channels_failing_is_an_error() {
        let mut deps = test_deps(vec![]);
        deps.ai = Arc::new(ScriptedAi::new(vec![]));
        assert!(generate_posts(&deps, input("x")).await.is_err());
    }

    #[tokio::test]
    async fn test_sources_include_transcripts_and_files() {
        let deps = test_deps(vec![]);
        let encoded = base64::engine::general_purpose::STANDARD.encode("file body");
        let mut req = input("x");
        req.selected_transcripts = Some(vec!["transcript body".to_string()]);
        req.attached_files = Some(vec![AttachedFileInput {
            name: "notes.txt".to_string(),
            content: encoded,
        }]);

        let sources = collect_content_sources(&deps, &req).await.unwrap();
        assert!(sources.contains("transcript body"));
        assert!(sources.contains("Content from file 'notes.txt'"));
        assert!(sources.contains("file body"));
    }

    #[tokio::test]
    async fn test_sources_include_video_transcript() {
        let mut deps = test_deps(vec![]);
        deps.captions = Arc::new(FixedCaptionSource {
            segments: vec![TranscriptSegment {
                start: 0.0,
                text: "video words".to_string(),
            }],
        });
        let mut req = input("x");
        req.youtube_url = Some("https://youtu.be/abc123".to_string());

        let sources = collect_content_sources(&deps, &req).await.unwrap();
        assert!(sources.contains("YouTube Video Transcript"));
        assert!(sources.contains("video words"));
    }

    #[test]
    fn test_prompt_carries_resolved_constraints() {
        let options = GenerationOptionsInput {
            all: Some(ChannelOptionsInput {
                language: Some("Spanish".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let prompt = blog_prompt("launch post", &options, "source text");
        assert!(prompt.contains("- Language: Spanish"));
        assert!(prompt.contains("- Word Count: Up to 1000 words"));
        assert!(prompt.contains("source text"));
        assert!(prompt.contains("launch post"));
    }
}
