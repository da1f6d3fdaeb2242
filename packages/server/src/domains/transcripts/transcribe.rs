//! Transcription pipelines for video URLs and uploaded files.
//!
//! Each pipeline step reports its local completion to the progress reporter,
//! which folds it into one monotonic overall percentage for subscribers.
//! Caption lookup, speech-to-text, and binary document extraction are
//! external collaborators behind kernel traits; this module owns the
//! orchestration, timestamp bookkeeping, and analysis phase.

use anyhow::{Context as _, Result};
use base64::Engine as _;

use super::analyze;
use super::data::{
    AnalysisResultData, AnalyzeTextResult, KeyInsightsData, SummaryData, TimestampData,
    TranscriptionResultData,
};
use super::pipeline::{stage, ProgressReporter};
use super::youtube;
use crate::kernel::traits::{AudioSource, CompletionParams};
use crate::kernel::ServerDeps;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const DOC_MIME: &str = "application/msword";

/// Transcribe a YouTube video: published captions first, speech-to-text
/// fallback, then the quick-analysis phase.
pub async fn transcribe_video(deps: &ServerDeps, url: &str) -> Result<TranscriptionResultData> {
    let reporter = ProgressReporter::new(deps.progress_hub.clone());
    match transcribe_video_inner(deps, &reporter, url).await {
        Ok(result) => Ok(result),
        Err(e) => {
            reporter.report_error(format!("Error: {e}")).await;
            Err(e)
        }
    }
}

async fn transcribe_video_inner(
    deps: &ServerDeps,
    reporter: &ProgressReporter,
    url: &str,
) -> Result<TranscriptionResultData> {
    let video_id = youtube::extract_video_id(url)
        .context("Invalid YouTube URL provided: could not extract video ID")?;

    reporter
        .report(stage::START, 0.0, "Starting transcription process...")
        .await;
    reporter
        .report(
            stage::CAPTION_FETCH,
            10.0,
            "Attempting to fetch published captions...",
        )
        .await;

    let captions = match deps.captions.fetch(&video_id).await {
        Ok(Some(segments)) if !segments.is_empty() => {
            reporter
                .report(stage::CAPTION_FETCH, 100.0, "Captions fetched successfully.")
                .await;
            Some(segments)
        }
        Ok(_) => {
            reporter
                .report(
                    stage::CAPTION_FETCH,
                    100.0,
                    "No captions available. Falling back to AI transcription.",
                )
                .await;
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, video_id, "Caption fetch failed");
            reporter
                .report(
                    stage::CAPTION_FETCH,
                    100.0,
                    format!("Caption fetch failed ({e}). Falling back to AI transcription."),
                )
                .await;
            None
        }
    };

    let (full_transcript, timestamps) = match captions {
        Some(segments) => assemble_transcript(
            segments
                .into_iter()
                .map(|s| TimestampData {
                    time: s.start,
                    text: s.text,
                })
                .collect(),
        ),
        None => {
            collect_audio_transcript(
                deps,
                reporter,
                AudioSource::YouTube {
                    video_id: video_id.clone(),
                },
            )
            .await?
        }
    };

    let (key_insights, summary_content) = if full_transcript.is_empty() {
        (None, None)
    } else {
        reporter
            .report(stage::MODEL_ANALYSIS, 50.0, "Generating quick insights...")
            .await;
        let insights = KeyInsightsData {
            title: "Top Terms".to_string(),
            points: analyze::top_terms(&full_transcript, 10),
        };

        reporter
            .report(stage::MODEL_ANALYSIS, 95.0, "Generating structured summary...")
            .await;
        let summary = analyze::structured_summary(deps, &full_transcript).await;

        reporter
            .report(stage::MODEL_ANALYSIS, 100.0, "Quick insights ready.")
            .await;
        (Some(insights), keep_summary(summary))
    };

    reporter
        .report(stage::COMPLETE, 100.0, "Processing complete!")
        .await;

    Ok(TranscriptionResultData {
        timestamps,
        full_transcript_content: full_transcript,
        analysis_data: None,
        key_insights,
        summary_content,
    })
}

/// Transcribe an uploaded file (base64 payload): documents are parsed to
/// text, audio and video go through the chunked speech-to-text path, and
/// everything ends with the full analysis phase.
pub async fn transcribe_file(
    deps: &ServerDeps,
    file_content: &str,
    file_name: &str,
    file_mime_type: &str,
) -> Result<TranscriptionResultData> {
    let reporter = ProgressReporter::new(deps.progress_hub.clone());
    match transcribe_file_inner(deps, &reporter, file_content, file_name, file_mime_type).await {
        Ok(result) => Ok(result),
        Err(e) => {
            reporter.report_error(format!("Error: {e}")).await;
            Err(e)
        }
    }
}

async fn transcribe_file_inner(
    deps: &ServerDeps,
    reporter: &ProgressReporter,
    file_content: &str,
    file_name: &str,
    file_mime_type: &str,
) -> Result<TranscriptionResultData> {
    reporter
        .report(stage::START, 0.0, "Starting file processing...")
        .await;
    reporter
        .report(stage::FILE_DECODE, 0.0, "Decoding file content...")
        .await;

    let bytes = decode_base64_payload(file_content)?;

    reporter
        .report(stage::FILE_DECODE, 100.0, "File decoded.")
        .await;

    let (full_transcript, mut timestamps) = match file_mime_type {
        "application/pdf" | DOCX_MIME | DOC_MIME => {
            reporter
                .report(
                    stage::DOCUMENT_PARSING,
                    0.0,
                    format!("Extracting text from {file_name}..."),
                )
                .await;
            let text = deps
                .documents
                .extract(&bytes, file_mime_type)
                .await
                .with_context(|| format!("Error extracting text from {file_name}"))?;
            reporter
                .report(stage::DOCUMENT_PARSING, 100.0, "Text extracted from document.")
                .await;
            (text, vec![])
        }
        "text/plain" => {
            reporter
                .report(stage::DOCUMENT_PARSING, 0.0, "Reading text file...")
                .await;
            let text = decode_text(bytes);
            reporter
                .report(stage::DOCUMENT_PARSING, 100.0, "Text file read.")
                .await;
            (text, vec![])
        }
        mime if mime.starts_with("audio/") || mime.starts_with("video/") => {
            collect_audio_transcript(
                deps,
                reporter,
                AudioSource::Upload {
                    file_name: file_name.to_string(),
                    bytes,
                },
            )
            .await?
        }
        other => anyhow::bail!("Unsupported file MIME type: {other}"),
    };

    let mut analysis_data = None;
    let mut key_insights = None;
    let mut summary_content = None;

    if !full_transcript.trim().is_empty() {
        reporter
            .report(stage::MODEL_ANALYSIS, 0.0, "Starting AI-powered analysis...")
            .await;

        reporter
            .report(stage::MODEL_ANALYSIS, 20.0, "Generating analysis metrics...")
            .await;
        let metrics = analyze::analysis_metrics(deps, &full_transcript).await;

        reporter
            .report(
                stage::MODEL_ANALYSIS,
                50.0,
                "Generating rephrasing suggestions...",
            )
            .await;
        let rephrase_suggestions = analyze::rephrase_suggestions(deps, &full_transcript).await;

        reporter
            .report(stage::MODEL_ANALYSIS, 80.0, "Simulating engagement data...")
            .await;
        let engagement_chart_data = analyze::engagement_chart(deps, &full_transcript).await;

        reporter
            .report(stage::MODEL_ANALYSIS, 90.0, "Generating key insights...")
            .await;
        key_insights = Some(analyze::key_insights(deps, &full_transcript).await);

        reporter
            .report(stage::MODEL_ANALYSIS, 95.0, "Generating structured summary...")
            .await;
        summary_content = keep_summary(analyze::structured_summary(deps, &full_transcript).await);

        // For documents, a concise summary doubles as the single
        // "timestamped" line shown in the transcript panel.
        if file_mime_type.starts_with("application/") || file_mime_type.starts_with("text/") {
            let prompt =
                format!("Summarize the following text concisely:\n\n{full_transcript}");
            match deps
                .ai
                .complete_turns(&[prompt], CompletionParams::new(0.7, 500))
                .await
            {
                Ok(summary) => timestamps = vec![TimestampData { time: 0.0, text: summary }],
                Err(e) => tracing::warn!(error = %e, "Document summary generation failed"),
            }
        }

        analysis_data = Some(AnalysisResultData {
            metrics,
            rephrase_suggestions,
            engagement_chart_data,
        });

        reporter
            .report(stage::MODEL_ANALYSIS, 100.0, "AI analysis complete!")
            .await;
    }

    reporter
        .report(stage::COMPLETE, 100.0, "Processing complete!")
        .await;

    Ok(TranscriptionResultData {
        timestamps,
        full_transcript_content: full_transcript,
        analysis_data,
        key_insights,
        summary_content,
    })
}

/// Analyze pasted text without a transcription phase. Always returns a
/// result: failed helpers degrade to their labeled defaults.
pub async fn analyze_text(deps: &ServerDeps, text: &str) -> AnalyzeTextResult {
    if text.trim().is_empty() {
        return AnalyzeTextResult {
            analysis_data: None,
            key_insights: Some(KeyInsightsData {
                title: "No Insights Available".to_string(),
                points: vec![],
            }),
            summary_content: Some(SummaryData {
                title: "No Summary Available".to_string(),
                subheader: String::new(),
                points: vec![],
            }),
        };
    }

    let reporter = ProgressReporter::new(deps.progress_hub.clone());
    reporter
        .report(stage::MODEL_ANALYSIS, 0.0, "Starting AI-powered analysis...")
        .await;

    let key_insights = KeyInsightsData {
        title: "Top Terms".to_string(),
        points: analyze::top_terms(text, 10),
    };
    let summary_content = analyze::structured_summary(deps, text).await;

    reporter
        .report(stage::MODEL_ANALYSIS, 100.0, "Quick insights ready.")
        .await;

    AnalyzeTextResult {
        analysis_data: None,
        key_insights: Some(key_insights),
        summary_content: Some(summary_content),
    }
}

/// Run the download → chunk → transcribe path, reporting chunk sub-steps.
async fn collect_audio_transcript(
    deps: &ServerDeps,
    reporter: &ProgressReporter,
    source: AudioSource,
) -> Result<(String, Vec<TimestampData>)> {
    reporter
        .report(stage::DOWNLOAD, 0.0, "Starting audio acquisition...")
        .await;
    let audio_handle = deps
        .transcriber
        .fetch_audio(&source)
        .await
        .context("Failed to acquire audio")?;
    reporter
        .report(stage::DOWNLOAD, 100.0, "Audio acquisition complete.")
        .await;

    reporter
        .report(stage::AUDIO_CHUNKING, 0.0, "Chunking audio...")
        .await;
    let chunks = deps
        .transcriber
        .chunk_audio(&audio_handle)
        .await
        .context("Error chunking audio")?;
    reporter
        .report(
            stage::AUDIO_CHUNKING,
            100.0,
            format!("Chunking audio: {} chunks prepared.", chunks.len()),
        )
        .await;

    let total = chunks.len();
    let mut timestamps = Vec::new();

    for (i, chunk) in chunks.iter().enumerate() {
        reporter
            .report_substeps(
                stage::TRANSCRIPTION,
                total,
                i,
                format!("Transcribing chunk {}/{total} with AI model...", i + 1),
            )
            .await;

        let segments = deps
            .transcriber
            .transcribe_chunk(chunk)
            .await
            .with_context(|| format!("Transcription failed on chunk {}", chunk.index))?;

        for segment in segments {
            let text = segment.text.trim();
            if !text.is_empty() {
                timestamps.push(TimestampData {
                    time: segment.start + chunk.offset_secs,
                    text: text.to_string(),
                });
            }
        }
    }

    reporter
        .report_substeps(stage::TRANSCRIPTION, total, total, "AI transcription complete.")
        .await;

    Ok(assemble_transcript(timestamps))
}

/// Join segment texts into the full transcript, dropping empty segments.
fn assemble_transcript(timestamps: Vec<TimestampData>) -> (String, Vec<TimestampData>) {
    let timestamps: Vec<TimestampData> = timestamps
        .into_iter()
        .filter(|t| !t.text.trim().is_empty())
        .collect();
    let full: Vec<&str> = timestamps.iter().map(|t| t.text.as_str()).collect();
    (full.join(" "), timestamps)
}

/// A summary whose generation failed outright carries no useful title;
/// the client shows nothing rather than a placeholder.
fn keep_summary(summary: SummaryData) -> Option<SummaryData> {
    if summary.title.is_empty() {
        None
    } else {
        Some(summary)
    }
}

/// Decode a base64 upload, tolerating a `data:...;base64,` prefix.
pub(crate) fn decode_base64_payload(content: &str) -> Result<Vec<u8>> {
    let data = content
        .split_once(',')
        .map(|(_, rest)| rest)
        .unwrap_or(content);
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .context("Failed to decode base64 file content")
}

/// Decode text bytes: UTF-8 first, Latin-1 as the lossless fallback.
pub(crate) fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}
