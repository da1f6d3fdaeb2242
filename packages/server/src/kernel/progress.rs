//! Weighted progress tracking for multi-stage pipelines.
//!
//! Each pipeline stage owns a fixed share of the overall 0–100 range. A
//! stage reports only its local completion (a percentage, or a sub-step
//! count for chunked stages) and [`overall_progress`] folds that into one
//! cumulative figure. The tracker holds no state between calls; it is a
//! pure function of its inputs, so stages never need to know their global
//! position.
//!
//! The composed figure is monotonic as long as the caller supplies
//! non-decreasing (stage, percentage) pairs; the tracker does not enforce
//! that ordering itself.

/// An ordered table of pipeline stages and their weights.
///
/// Weights are integer shares of the overall range; the table order defines
/// the cumulative sum. At most one stage may be designated as the sub-step
/// stage, whose contribution is driven by a completed/total chunk ratio
/// instead of a percentage.
#[derive(Debug, Clone)]
pub struct StageTable {
    stages: Vec<(&'static str, u32)>,
    substep_stage: Option<&'static str>,
}

impl StageTable {
    pub fn new(stages: Vec<(&'static str, u32)>) -> Self {
        Self {
            stages,
            substep_stage: None,
        }
    }

    /// Designate the stage whose progress is reported in sub-steps.
    ///
    /// Only one sub-step stage is supported per table; calling this twice
    /// replaces the previous designation.
    pub fn with_substep_stage(mut self, stage: &'static str) -> Self {
        debug_assert!(
            self.stages.iter().any(|(name, _)| *name == stage),
            "sub-step stage must be in the table"
        );
        self.substep_stage = Some(stage);
        self
    }

    /// Weight of a single stage; unknown stages weigh 0.
    pub fn weight_of(&self, stage: &str) -> u32 {
        self.stages
            .iter()
            .find(|(name, _)| *name == stage)
            .map(|(_, weight)| *weight)
            .unwrap_or(0)
    }

    /// Sum of the weights of all stages strictly preceding `stage`.
    ///
    /// An unknown stage has no position in the ordering and contributes
    /// nothing, so its preceding weight is 0.
    pub fn preceding_weight(&self, stage: &str) -> u32 {
        let mut sum = 0;
        for (name, weight) in &self.stages {
            if *name == stage {
                return sum;
            }
            sum += weight;
        }
        0
    }

    fn is_substep_stage(&self, stage: &str) -> bool {
        self.substep_stage == Some(stage)
    }
}

/// Fold the current stage and its local completion into an overall 0–100
/// percentage.
///
/// `stage_percentage` is the completion of the current stage itself. For the
/// table's designated sub-step stage, `completed_sub_steps / total_sub_steps`
/// drives the contribution instead (the ratio is clamped to 1.0, so a caller
/// overshooting the sub-step count cannot exceed the stage's weight).
pub fn overall_progress(
    table: &StageTable,
    current_stage: &str,
    stage_percentage: f64,
    total_sub_steps: usize,
    completed_sub_steps: usize,
) -> u8 {
    let completed_weight = table.preceding_weight(current_stage) as f64;
    let stage_weight = table.weight_of(current_stage) as f64;

    let within_stage = if table.is_substep_stage(current_stage) && total_sub_steps > 0 {
        let ratio = (completed_sub_steps as f64 / total_sub_steps as f64).min(1.0);
        ratio * stage_weight
    } else {
        (stage_percentage / 100.0).clamp(0.0, 1.0) * stage_weight
    };

    (completed_weight + within_stage).clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StageTable {
        StageTable::new(vec![
            ("download", 10),
            ("chunk", 15),
            ("transcribe", 40),
            ("process", 25),
            ("finalize", 10),
        ])
        .with_substep_stage("transcribe")
    }

    #[test]
    fn test_first_stage_starts_at_zero() {
        assert_eq!(overall_progress(&table(), "download", 0.0, 1, 0), 0);
    }

    #[test]
    fn test_stage_contribution_scales_with_percentage() {
        let t = table();
        assert_eq!(overall_progress(&t, "download", 50.0, 1, 0), 5);
        assert_eq!(overall_progress(&t, "download", 100.0, 1, 0), 10);
        assert_eq!(overall_progress(&t, "chunk", 0.0, 1, 0), 10);
        assert_eq!(overall_progress(&t, "chunk", 100.0, 1, 0), 25);
    }

    #[test]
    fn test_substep_stage_uses_chunk_ratio() {
        // 5 of 10 chunks through a 40-point stage after 25 completed points.
        assert_eq!(overall_progress(&table(), "transcribe", 0.0, 10, 5), 45);
    }

    #[test]
    fn test_substep_overshoot_clamps_to_stage_weight() {
        let t = table();
        assert_eq!(overall_progress(&t, "transcribe", 0.0, 10, 15), 65);
        assert_eq!(overall_progress(&t, "transcribe", 0.0, 10, 10), 65);
    }

    #[test]
    fn test_final_stage_complete_is_exactly_100() {
        assert_eq!(overall_progress(&table(), "finalize", 100.0, 1, 0), 100);
    }

    #[test]
    fn test_monotonic_within_a_stage() {
        let t = table();
        let mut last = 0;
        for pct in 0..=100 {
            let current = overall_progress(&t, "process", pct as f64, 1, 0);
            assert!(current >= last, "regressed at {pct}%");
            last = current;
        }
    }

    #[test]
    fn test_monotonic_across_stages() {
        let t = table();
        let checkpoints = [
            overall_progress(&t, "download", 100.0, 1, 0),
            overall_progress(&t, "chunk", 0.0, 1, 0),
            overall_progress(&t, "chunk", 100.0, 1, 0),
            overall_progress(&t, "transcribe", 0.0, 4, 0),
            overall_progress(&t, "transcribe", 0.0, 4, 4),
            overall_progress(&t, "process", 100.0, 1, 0),
            overall_progress(&t, "finalize", 100.0, 1, 0),
        ];
        for pair in checkpoints.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_unknown_stage_has_zero_weight() {
        assert_eq!(overall_progress(&table(), "mystery", 100.0, 1, 0), 0);
    }

    #[test]
    fn test_percentage_out_of_range_is_clamped() {
        let t = table();
        assert_eq!(overall_progress(&t, "download", 150.0, 1, 0), 10);
        assert_eq!(overall_progress(&t, "download", -20.0, 1, 0), 0);
    }

    #[test]
    fn test_zero_substeps_falls_back_to_percentage() {
        assert_eq!(overall_progress(&table(), "transcribe", 50.0, 0, 0), 45);
    }
}
