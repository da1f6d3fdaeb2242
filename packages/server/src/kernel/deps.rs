//! Server dependencies for domain actions (using traits for testability)
//!
//! This module provides the central dependency container handed to all
//! domain actions. External services hide behind trait abstractions so the
//! pipelines can run against canned doubles in tests.

use std::path::PathBuf;
use std::sync::Arc;

use super::jobs::JobRegistry;
use super::progress_hub::ProgressHub;
use super::traits::{
    BaseCaptionSource, BaseDocumentExtractor, BaseGenerativeAi, BaseTranscriber,
};

/// Server dependencies accessible to domain actions.
#[derive(Clone)]
pub struct ServerDeps {
    /// Generative model for all LLM-backed helpers.
    pub ai: Arc<dyn BaseGenerativeAi>,
    /// Published-caption lookup for video sources.
    pub captions: Arc<dyn BaseCaptionSource>,
    /// Speech-to-text backend for the audio fallback path.
    pub transcriber: Arc<dyn BaseTranscriber>,
    /// Binary document text extraction (PDF, Word).
    pub documents: Arc<dyn BaseDocumentExtractor>,
    /// In-memory registry for background enrichment jobs.
    pub jobs: JobRegistry,
    /// In-process pub/sub hub feeding the SSE progress endpoint.
    pub progress_hub: ProgressHub,
    /// Directory for raw model reply dumps; `None` disables them.
    pub raw_log_dir: Option<PathBuf>,
}

impl ServerDeps {
    pub fn new(
        ai: Arc<dyn BaseGenerativeAi>,
        captions: Arc<dyn BaseCaptionSource>,
        transcriber: Arc<dyn BaseTranscriber>,
        documents: Arc<dyn BaseDocumentExtractor>,
        jobs: JobRegistry,
        progress_hub: ProgressHub,
        raw_log_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            ai,
            captions,
            transcriber,
            documents,
            jobs,
            progress_hub,
            raw_log_dir,
        }
    }
}
