//! Stage table and progress reporting for the transcription pipeline.
//!
//! Stage weights are the fixed shares each phase contributes to the overall
//! figure; they sum to 100 across the table. Transcription is the chunked
//! stage: its share is spread over audio chunks rather than a percentage.

use crate::kernel::progress::{overall_progress, StageTable};
use crate::kernel::progress_hub::{ProgressHub, ProgressUpdate, PROGRESS_TOPIC};

pub mod stage {
    pub const START: &str = "start";
    pub const CAPTION_FETCH: &str = "youtube_api_fetch";
    pub const DOWNLOAD: &str = "download";
    pub const FILE_DECODE: &str = "file_decode";
    pub const DOCUMENT_PARSING: &str = "document_parsing";
    pub const AUDIO_CHUNKING: &str = "audio_chunking";
    pub const TRANSCRIPTION: &str = "ai_transcription";
    pub const MODEL_PROCESSING: &str = "gemini_processing";
    pub const MODEL_ANALYSIS: &str = "gemini_analysis";
    pub const COMPLETE: &str = "complete";
}

/// The transcription pipeline's stage table.
pub fn stage_table() -> StageTable {
    StageTable::new(vec![
        (stage::START, 0),
        (stage::CAPTION_FETCH, 10),
        (stage::DOWNLOAD, 10),
        (stage::FILE_DECODE, 5),
        (stage::DOCUMENT_PARSING, 5),
        (stage::AUDIO_CHUNKING, 15),
        (stage::TRANSCRIPTION, 40),
        (stage::MODEL_PROCESSING, 5),
        (stage::MODEL_ANALYSIS, 10),
        (stage::COMPLETE, 0),
    ])
    .with_substep_stage(stage::TRANSCRIPTION)
}

/// Publishes weighted progress updates for one pipeline run.
#[derive(Clone)]
pub struct ProgressReporter {
    hub: ProgressHub,
    table: StageTable,
}

impl ProgressReporter {
    pub fn new(hub: ProgressHub) -> Self {
        Self {
            hub,
            table: stage_table(),
        }
    }

    /// Report stage completion as a percentage of that stage.
    pub async fn report(&self, stage: &str, stage_percentage: f64, status: impl Into<String>) {
        let percentage = overall_progress(&self.table, stage, stage_percentage, 1, 0);
        self.hub
            .publish(PROGRESS_TOPIC, ProgressUpdate::overall(status, percentage))
            .await;
    }

    /// Report progress through the chunked transcription stage.
    pub async fn report_substeps(
        &self,
        stage: &str,
        total_sub_steps: usize,
        completed_sub_steps: usize,
        status: impl Into<String>,
    ) {
        let percentage = overall_progress(
            &self.table,
            stage,
            0.0,
            total_sub_steps,
            completed_sub_steps,
        );
        self.hub
            .publish(PROGRESS_TOPIC, ProgressUpdate::overall(status, percentage))
            .await;
    }

    /// Report a pipeline failure; the bar resets to zero.
    pub async fn report_error(&self, status: impl Into<String>) {
        self.hub
            .publish(PROGRESS_TOPIC, ProgressUpdate::overall(status, 0))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one_hundred() {
        let table = stage_table();
        let sum: u32 = [
            stage::START,
            stage::CAPTION_FETCH,
            stage::DOWNLOAD,
            stage::FILE_DECODE,
            stage::DOCUMENT_PARSING,
            stage::AUDIO_CHUNKING,
            stage::TRANSCRIPTION,
            stage::MODEL_PROCESSING,
            stage::MODEL_ANALYSIS,
            stage::COMPLETE,
        ]
        .iter()
        .map(|s| table.weight_of(s))
        .sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn test_complete_stage_reports_one_hundred() {
        let table = stage_table();
        assert_eq!(
            overall_progress(&table, stage::COMPLETE, 100.0, 1, 0),
            100
        );
    }

    #[test]
    fn test_transcription_substeps_drive_its_share() {
        let table = stage_table();
        // 45 points of preceding stages plus half of transcription's 40.
        assert_eq!(
            overall_progress(&table, stage::TRANSCRIPTION, 0.0, 10, 5),
            65
        );
    }

    #[tokio::test]
    async fn test_reporter_publishes_weighted_updates() {
        let hub = ProgressHub::new();
        let mut rx = hub.subscribe(PROGRESS_TOPIC).await;
        let reporter = ProgressReporter::new(hub);

        reporter
            .report(stage::DOWNLOAD, 50.0, "Downloading audio: 50%")
            .await;

        let update = rx.recv().await.unwrap();
        assert_eq!(update.percentage, 15); // 10 (captions) + half of 10
        assert_eq!(update.status, "Downloading audio: 50%");
    }
}
