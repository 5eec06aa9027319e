//! Pairwise similarity scoring and suspicious-pair selection.

pub mod selector;

pub use selector::{RankMetric, SelectionPolicy, select_pairs};

use crate::models::{MetricBreakdown, PairComparison, ScoringProfile, SubmissionRecord};
use crate::similarity::compare_texts;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which text of a submission is compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// Cleaned original-language source.
    #[default]
    Source,
    /// Compiled C plus cleaned assembly.
    CompiledAssembly,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseScorer {
    pub mode: ComparisonMode,
    pub profile: ScoringProfile,
}

impl PairwiseScorer {
    pub fn new(mode: ComparisonMode, profile: ScoringProfile) -> Self {
        Self { mode, profile }
    }

    fn comparison_text<'a>(&self, record: &'a SubmissionRecord) -> &'a str {
        match self.mode {
            ComparisonMode::Source => &record.cleaned_source,
            ComparisonMode::CompiledAssembly => &record.compiled_or_raw_asm,
        }
    }

    fn metrics(&self, a: &str, b: &str) -> MetricBreakdown {
        match self.profile {
            ScoringProfile::MeanOfTwo => compare_texts(a, b),
            ScoringProfile::MaxOfMetrics if a.is_empty() || b.is_empty() => {
                MetricBreakdown::default()
            }
            ScoringProfile::MaxOfMetrics => compare_texts(a, b),
        }
    }

    /// Score one unordered pair. Pure and symmetric in its arguments' scores.
    pub fn score_pair(&self, a: &SubmissionRecord, b: &SubmissionRecord) -> PairComparison {
        let (text_a, text_b) = (self.comparison_text(a), self.comparison_text(b));
        let source = self.metrics(text_a, text_b);
        let hex_metrics = self.metrics(&a.hex_payload, &b.hex_payload);

        let (avg_score, hex_score) = match self.profile {
            ScoringProfile::MeanOfTwo => (source.mean(), hex_metrics.levenshtein),
            ScoringProfile::MaxOfMetrics => (source.max(), hex_metrics.max()),
        };

        PairComparison {
            student_a: a.student.clone(),
            student_b: b.student.clone(),
            token_seq_score: source.token_seq,
            levenshtein_score: source.levenshtein,
            hex_score,
            avg_score,
            hex_metrics,
            profile: self.profile,
            source_evidence: !text_a.is_empty() && !text_b.is_empty(),
            hex_evidence: !a.hex_payload.is_empty() && !b.hex_payload.is_empty(),
        }
    }

    /// Score every unordered pair `(i, j)` with `i < j`, in parallel.
    ///
    /// Output order is the combination order of `records`.
    pub fn score_all(
        &self,
        records: &[SubmissionRecord],
        progress_bar: &ProgressBar,
    ) -> Vec<PairComparison> {
        let pairs: Vec<(usize, usize)> = (0..records.len())
            .flat_map(|i| (i + 1..records.len()).map(move |j| (i, j)))
            .collect();

        pairs
            .par_iter()
            .map(|&(i, j)| {
                let comparison = self.score_pair(&records[i], &records[j]);
                progress_bar.inc(1);
                comparison
            })
            .collect()
    }
}

/// Number of unordered pairs among `n` students.
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubmissionRecordBuilder;

    fn record(student: &str, source: &str, asm: &str, hex: &str) -> SubmissionRecord {
        SubmissionRecordBuilder::default()
            .student(student.to_string())
            .cleaned_source(source.to_string())
            .compiled_or_raw_asm(asm.to_string())
            .hex_payload(hex.to_string())
            .build()
            .unwrap()
    }

    #[test]
    fn test_score_pair_mean_profile() {
        let a = record("a", "mov a, #55h add a, r0", "", "0200030203e8");
        let b = record("b", "mov a, #85 add a, r1", "", "0200030203e8");
        let scorer = PairwiseScorer::default();

        let cmp = scorer.score_pair(&a, &b);

        assert!((cmp.token_seq_score - 8.0 / 12.0).abs() < 1e-9);
        assert!(
            (cmp.avg_score - (cmp.token_seq_score + cmp.levenshtein_score) / 2.0).abs() < 1e-12
        );
        assert_eq!(cmp.hex_score, 1.0);
        assert_eq!(cmp.profile, ScoringProfile::MeanOfTwo);
    }

    #[test]
    fn test_score_pair_is_symmetric() {
        let a = record("a", "mov a, #1 ret", "mov a, #1", "0201");
        let b = record("b", "mov a, #2 ret", "clr a", "0202ff");
        for profile in [ScoringProfile::MeanOfTwo, ScoringProfile::MaxOfMetrics] {
            for mode in [ComparisonMode::Source, ComparisonMode::CompiledAssembly] {
                let scorer = PairwiseScorer::new(mode, profile);
                let ab = scorer.score_pair(&a, &b);
                let ba = scorer.score_pair(&b, &a);
                assert_eq!(ab.token_seq_score, ba.token_seq_score);
                assert_eq!(ab.levenshtein_score, ba.levenshtein_score);
                assert_eq!(ab.hex_score, ba.hex_score);
                assert_eq!(ab.avg_score, ba.avg_score);
            }
        }
    }

    #[test]
    fn test_compiled_assembly_mode_uses_asm_text() {
        let a = record("a", "p1 = 0x55;", "mov p1, #55h", "");
        let b = record("b", "p1 = 0xaa;", "mov p1, #55h", "");
        let scorer = PairwiseScorer::new(ComparisonMode::CompiledAssembly, ScoringProfile::MeanOfTwo);

        let cmp = scorer.score_pair(&a, &b);
        assert_eq!(cmp.avg_score, 1.0);
    }

    #[test]
    fn test_mean_profile_applies_empty_rules_to_hex() {
        let a = record("a", "mov a, #1", "", "");
        let b = record("b", "mov a, #1", "", "");
        let c = record("c", "mov a, #1", "", "020304");

        let scorer = PairwiseScorer::default();
        let ab = scorer.score_pair(&a, &b);
        assert_eq!(ab.hex_score, 1.0);
        assert!(!ab.hex_evidence);
        assert!(ab.source_evidence);
        assert_eq!(scorer.score_pair(&a, &c).hex_score, 0.0);
    }

    #[test]
    fn test_evidence_follows_comparison_mode() {
        let a = record("a", "p1 = 0x55;", "", "02");
        let b = record("b", "p1 = 0x55;", "mov p1, #55h", "02");

        let source = PairwiseScorer::default().score_pair(&a, &b);
        assert!(source.source_evidence && source.hex_evidence);
        assert!(source.is_exact_match());

        let asm = PairwiseScorer::new(ComparisonMode::CompiledAssembly, ScoringProfile::MeanOfTwo)
            .score_pair(&a, &b);
        assert!(!asm.source_evidence);
    }

    #[test]
    fn test_max_profile_treats_missing_text_as_no_evidence() {
        let a = record("a", "", "", "");
        let b = record("b", "", "", "");
        let scorer = PairwiseScorer::new(ComparisonMode::Source, ScoringProfile::MaxOfMetrics);

        let cmp = scorer.score_pair(&a, &b);
        assert_eq!(cmp.avg_score, 0.0);
        assert_eq!(cmp.hex_score, 0.0);
    }

    #[test]
    fn test_max_profile_takes_best_metric() {
        let a = record("a", "mov a, #55h add a, r0", "", "0200030203e8");
        let b = record("b", "mov a, #85 add a, r1", "", "0200030203e9");
        let scorer = PairwiseScorer::new(ComparisonMode::Source, ScoringProfile::MaxOfMetrics);

        let cmp = scorer.score_pair(&a, &b);
        assert_eq!(
            cmp.avg_score,
            cmp.token_seq_score.max(cmp.levenshtein_score)
        );
        assert_eq!(cmp.hex_score, cmp.hex_metrics.levenshtein);
    }

    #[test]
    fn test_score_all_enumerates_combinations() {
        let records: Vec<_> = ["s1", "s2", "s3", "s4"]
            .iter()
            .map(|s| record(s, "mov a, #1", "", "0201"))
            .collect();

        let comparisons = PairwiseScorer::default().score_all(&records, &ProgressBar::hidden());

        assert_eq!(comparisons.len(), pair_count(records.len()));
        let names: Vec<(&str, &str)> = comparisons
            .iter()
            .map(|c| (c.student_a.as_str(), c.student_b.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("s1", "s2"),
                ("s1", "s3"),
                ("s1", "s4"),
                ("s2", "s3"),
                ("s2", "s4"),
                ("s3", "s4"),
            ]
        );
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_count(0), 0);
        assert_eq!(pair_count(1), 0);
        assert_eq!(pair_count(2), 1);
        assert_eq!(pair_count(9), 36);
    }
}
