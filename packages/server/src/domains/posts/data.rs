//! GraphQL data types for multi-channel post generation.

use juniper::{GraphQLInputObject, GraphQLObject};

/// Per-channel generation options. Channel-specific values win over the
/// `all` block, which wins over the built-in channel defaults.
#[derive(Debug, Clone, Default, GraphQLInputObject)]
pub struct ChannelOptionsInput {
    pub tone_style: Option<String>,
    pub word_count: Option<i32>,
    pub character_count: Option<i32>,
    pub focus_keywords: Option<String>,
    pub target_audience: Option<String>,
    pub language: Option<String>,
    pub formality: Option<i32>,
    pub creativity_level: Option<i32>,
}

#[derive(Debug, Clone, Default, GraphQLInputObject)]
pub struct GenerationOptionsInput {
    pub all: Option<ChannelOptionsInput>,
    pub blog: Option<ChannelOptionsInput>,
    pub linkedin: Option<ChannelOptionsInput>,
    pub newsletter: Option<ChannelOptionsInput>,
    pub twitter: Option<ChannelOptionsInput>,
}

/// An uploaded file attached to a generation request (base64 content).
#[derive(Debug, Clone, GraphQLInputObject)]
pub struct AttachedFileInput {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, GraphQLInputObject)]
pub struct GeneratePostsInput {
    pub prompt: String,
    pub options: Option<GenerationOptionsInput>,
    pub selected_transcripts: Option<Vec<String>>,
    pub attached_files: Option<Vec<AttachedFileInput>>,
    pub youtube_url: Option<String>,
}

/// One generated post per channel; a channel that failed comes back empty.
#[derive(Debug, Clone, GraphQLObject)]
pub struct GeneratedPostsData {
    pub blog: String,
    pub linkedin: String,
    pub newsletter: String,
    pub twitter: String,
}

/// Outcome of publishing a blog post externally. Failures are reported
/// in-band as an error message in `blog_url`.
#[derive(Debug, Clone, GraphQLObject)]
pub struct DevToPostResult {
    pub blog_url: String,
}

/// Fully merged options for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub tone: String,
    pub length_limit: i32,
    /// Whether `length_limit` counts words (blog) or characters.
    pub length_in_words: bool,
    pub keywords: String,
    pub audience: String,
    pub language: String,
    pub formality: i32,
    pub creativity: i32,
}

/// Built-in defaults for one channel.
pub struct ChannelDefaults {
    pub tone: &'static str,
    pub length_limit: i32,
    pub length_in_words: bool,
    pub keywords: &'static str,
    pub audience: &'static str,
    pub formality: i32,
    pub creativity: i32,
}

/// Merge channel-specific options over the `all` block over defaults.
pub fn resolve_options(
    channel: Option<&ChannelOptionsInput>,
    all: Option<&ChannelOptionsInput>,
    defaults: &ChannelDefaults,
) -> ResolvedOptions {
    fn pick<T: Clone>(
        channel: Option<&ChannelOptionsInput>,
        all: Option<&ChannelOptionsInput>,
        get: impl Fn(&ChannelOptionsInput) -> Option<T>,
    ) -> Option<T> {
        channel.and_then(&get).or_else(|| all.and_then(&get))
    }

    let length_limit = if defaults.length_in_words {
        pick(channel, all, |o| o.word_count)
    } else {
        pick(channel, all, |o| o.character_count)
    }
    .unwrap_or(defaults.length_limit);

    ResolvedOptions {
        tone: pick(channel, all, |o| o.tone_style.clone()).unwrap_or_else(|| defaults.tone.to_string()),
        length_limit,
        length_in_words: defaults.length_in_words,
        keywords: pick(channel, all, |o| o.focus_keywords.clone())
            .unwrap_or_else(|| defaults.keywords.to_string()),
        audience: pick(channel, all, |o| o.target_audience.clone())
            .unwrap_or_else(|| defaults.audience.to_string()),
        language: pick(channel, all, |o| o.language.clone()).unwrap_or_else(|| "English".to_string()),
        formality: pick(channel, all, |o| o.formality).unwrap_or(defaults.formality),
        creativity: pick(channel, all, |o| o.creativity_level).unwrap_or(defaults.creativity),
    }
}
