// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Business logic
// (what to prompt for, how to normalize a reply) lives in domain functions
// that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseGenerativeAi)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Generative AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

/// Provider-agnostic sampling parameters for a completion.
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1000,
        }
    }
}

impl CompletionParams {
    pub fn new(temperature: f64, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
        }
    }
}

#[async_trait]
pub trait BaseGenerativeAi: Send + Sync {
    /// Complete a multi-turn exchange with explicit sampling parameters
    /// (returns the raw text reply).
    async fn complete_turns(&self, turns: &[String], params: CompletionParams) -> Result<String>;

    /// Complete a single-turn prompt with default parameters.
    async fn complete(&self, prompt: &str) -> Result<String> {
        let turns = [prompt.to_string()];
        self.complete_turns(&turns, CompletionParams::default()).await
    }
}

// =============================================================================
// Caption Source Trait (Infrastructure - published video transcripts)
// =============================================================================

/// One timed segment of transcript text.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// Segment start in seconds from the beginning of the media.
    pub start: f64,
    pub text: String,
}

#[async_trait]
pub trait BaseCaptionSource: Send + Sync {
    /// Fetch published captions for a video. `Ok(None)` when the video has
    /// no captions available in any language.
    async fn fetch(&self, video_id: &str) -> Result<Option<Vec<TranscriptSegment>>>;
}

/// Fallback caption source for environments without a caption backend.
pub struct NoopCaptionSource;

#[async_trait]
impl BaseCaptionSource for NoopCaptionSource {
    async fn fetch(&self, video_id: &str) -> Result<Option<Vec<TranscriptSegment>>> {
        tracing::warn!(video_id, "NoopCaptionSource: no caption backend configured");
        Ok(None)
    }
}

// =============================================================================
// Transcriber Trait (Infrastructure - speech-to-text)
// =============================================================================

/// Where pipeline audio comes from.
#[derive(Debug, Clone)]
pub enum AudioSource {
    YouTube { video_id: String },
    Upload { file_name: String, bytes: Vec<u8> },
}

/// One fixed-length slice of prepared audio.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub index: usize,
    /// Offset of this chunk from the start of the media, in seconds.
    pub offset_secs: f64,
    /// Backend-specific handle for the chunk's data.
    pub handle: String,
}

#[async_trait]
pub trait BaseTranscriber: Send + Sync {
    /// Acquire the audio for a source and return an opaque handle to it.
    async fn fetch_audio(&self, source: &AudioSource) -> Result<String>;

    /// Split prepared audio into transcribable chunks.
    async fn chunk_audio(&self, audio_handle: &str) -> Result<Vec<AudioChunk>>;

    /// Transcribe a single chunk. Segment times are relative to the chunk;
    /// the pipeline applies the chunk offset.
    async fn transcribe_chunk(&self, chunk: &AudioChunk) -> Result<Vec<TranscriptSegment>>;
}

/// Fallback transcriber for environments without a speech backend.
pub struct NoopTranscriber;

#[async_trait]
impl BaseTranscriber for NoopTranscriber {
    async fn fetch_audio(&self, _source: &AudioSource) -> Result<String> {
        anyhow::bail!("no transcription backend configured")
    }

    async fn chunk_audio(&self, _audio_handle: &str) -> Result<Vec<AudioChunk>> {
        anyhow::bail!("no transcription backend configured")
    }

    async fn transcribe_chunk(&self, _chunk: &AudioChunk) -> Result<Vec<TranscriptSegment>> {
        anyhow::bail!("no transcription backend configured")
    }
}

// =============================================================================
// Document Extractor Trait (Infrastructure - binary document text)
// =============================================================================

#[async_trait]
pub trait BaseDocumentExtractor: Send + Sync {
    /// Extract plain text from a binary document (PDF, Word). Plain-text
    /// payloads never reach this trait; the pipeline decodes those itself.
    async fn extract(&self, bytes: &[u8], mime_type: &str) -> Result<String>;
}

/// Fallback extractor for environments without a document backend.
pub struct NoopDocumentExtractor;

#[async_trait]
impl BaseDocumentExtractor for NoopDocumentExtractor {
    async fn extract(&self, _bytes: &[u8], mime_type: &str) -> Result<String> {
        anyhow::bail!("no document extraction backend configured for {mime_type}")
    }
}
