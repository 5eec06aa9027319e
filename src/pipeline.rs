//! End-to-end batch analysis over prepared submission records.

use crate::models::{AnalysisReport, AnomalousSubmission, IllegalSubmission, SubmissionRecord};
use crate::scoring::{PairwiseScorer, SelectionPolicy, pair_count, select_pairs};
use crate::verdict::VerdictEngine;
use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::info;

pub struct Pipeline {
    scorer: PairwiseScorer,
    policy: SelectionPolicy,
    engine: VerdictEngine,
    progress: Option<MultiProgress>,
}

impl Pipeline {
    pub fn new(scorer: PairwiseScorer, policy: SelectionPolicy, engine: VerdictEngine) -> Self {
        Self {
            scorer,
            policy,
            engine,
            progress: None,
        }
    }

    /// Draw progress bars for the scoring and verdict phases.
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Score all pairs, select the suspicious ones, decide verdicts and
    /// collect illegal and anomalous submissions.
    pub fn run(&self, records: &[SubmissionRecord]) -> Result<AnalysisReport> {
        let total = pair_count(records.len());
        info!("Comparing {} pairs among {} students", total, records.len());

        let progress_bar = self.progress_bar(total, "pairs compared");
        let scored = self.scorer.score_all(records, &progress_bar);
        progress_bar.finish_and_clear();
        let total_pairs = scored.len();

        let selected = select_pairs(scored, &self.policy);
        info!(
            "{} of {} pairs selected for verdict analysis (oracle: {})",
            selected.len(),
            total_pairs,
            self.engine.oracle_name()
        );

        let progress_bar = self.progress_bar(selected.len(), "pairs judged");
        let comparisons = self.engine.evaluate(selected, records, &progress_bar)?;
        progress_bar.finish_and_clear();

        Ok(AnalysisReport {
            comparisons,
            total_pairs,
            illegal_submissions: illegal_submissions(records),
            anomalous_submissions: anomalous_submissions(records),
        })
    }

    fn progress_bar(&self, len: usize, unit: &str) -> ProgressBar {
        let Some(multi) = &self.progress else {
            return ProgressBar::hidden();
        };

        let progress_bar = ProgressBar::new(len as u64);
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}})",
            unit
        );
        if let Ok(style) = ProgressStyle::default_bar().template(&template) {
            progress_bar.set_style(style.progress_chars("#>-"));
        }
        multi.add(progress_bar)
    }
}

pub fn illegal_submissions(records: &[SubmissionRecord]) -> Vec<IllegalSubmission> {
    records
        .iter()
        .filter(|record| record.is_illegal)
        .map(|record| IllegalSubmission {
            student: record.student.clone(),
            reason: record.illegal_reason.clone().unwrap_or_default(),
        })
        .collect()
}

pub fn anomalous_submissions(records: &[SubmissionRecord]) -> Vec<AnomalousSubmission> {
    records
        .iter()
        .filter(|record| record.has_anomalies())
        .map(|record| AnomalousSubmission {
            student: record.student.clone(),
            source_anomalies: record.source_anomalies.clone(),
            hex_anomalies: record.hex_anomalies.clone(),
        })
        .collect()
}
