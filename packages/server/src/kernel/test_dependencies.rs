//! Canned dependency implementations for tests.
//!
//! These doubles let pipeline and action tests run without network access:
//! the AI returns scripted replies in order, the caption source and
//! transcriber serve fixed segments.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use super::deps::ServerDeps;
use super::jobs::JobRegistry;
use super::progress_hub::ProgressHub;
use super::traits::{
    AudioChunk, AudioSource, BaseCaptionSource, BaseGenerativeAi, BaseTranscriber,
    CompletionParams, NoopDocumentExtractor, TranscriptSegment,
};

/// AI double returning scripted replies in submission order. Once the
/// script runs out, every further call fails.
#[derive(Default)]
pub struct ScriptedAi {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedAi {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
        }
    }
}

#[async_trait]
impl BaseGenerativeAi for ScriptedAi {
    async fn complete_turns(&self, _turns: &[String], _params: CompletionParams) -> Result<String> {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted AI has no replies left"))
    }
}

/// Caption source serving one fixed transcript for any video id.
pub struct FixedCaptionSource {
    pub segments: Vec<TranscriptSegment>,
}

#[async_trait]
impl BaseCaptionSource for FixedCaptionSource {
    async fn fetch(&self, _video_id: &str) -> Result<Option<Vec<TranscriptSegment>>> {
        if self.segments.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.segments.clone()))
        }
    }
}

/// Transcriber double producing `chunks` fixed-length chunks, each
/// transcribing to a single canned segment.
pub struct FixedTranscriber {
    pub chunks: usize,
    pub chunk_secs: f64,
}

#[async_trait]
impl BaseTranscriber for FixedTranscriber {
    async fn fetch_audio(&self, source: &AudioSource) -> Result<String> {
        Ok(match source {
            AudioSource::YouTube { video_id } => format!("audio:{video_id}"),
            AudioSource::Upload { file_name, .. } => format!("audio:{file_name}"),
        })
    }

    async fn chunk_audio(&self, audio_handle: &str) -> Result<Vec<AudioChunk>> {
        Ok((0..self.chunks)
            .map(|i| AudioChunk {
                index: i,
                offset_secs: i as f64 * self.chunk_secs,
                handle: format!("{audio_handle}:chunk-{i}"),
            })
            .collect())
    }

    async fn transcribe_chunk(&self, chunk: &AudioChunk) -> Result<Vec<TranscriptSegment>> {
        Ok(vec![TranscriptSegment {
            start: 0.5,
            text: format!("chunk {} text", chunk.index),
        }])
    }
}

/// Build a full `ServerDeps` around a scripted AI, with captionless video
/// lookups and a two-chunk transcriber.
pub fn test_deps(ai_replies: Vec<&str>) -> ServerDeps {
    ServerDeps::new(
        Arc::new(ScriptedAi::new(ai_replies)),
        Arc::new(FixedCaptionSource { segments: vec![] }),
        Arc::new(FixedTranscriber {
            chunks: 2,
            chunk_secs: 60.0,
        }),
        Arc::new(NoopDocumentExtractor),
        JobRegistry::new(),
        ProgressHub::new(),
        None,
    )
}
