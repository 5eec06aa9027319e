//! Choice of which scored pairs proceed to verdict analysis.

use crate::models::PairComparison;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HEX_THRESHOLD: f64 = 0.7;
pub const DEFAULT_SRC_THRESHOLD: f64 = 0.8;
pub const DEFAULT_TOP_PERCENT: f64 = 0.05;

/// Metric used to rank pairs in top-percent selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    TokenSeq,
    Levenshtein,
    #[default]
    Average,
}

impl RankMetric {
    pub fn value(&self, comparison: &PairComparison) -> f64 {
        match self {
            Self::TokenSeq => comparison.token_seq_score,
            Self::Levenshtein => comparison.levenshtein_score,
            Self::Average => comparison.avg_score,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Keep a pair iff `hex_score > hex_threshold || avg_score > src_threshold`.
    Threshold {
        hex_threshold: f64,
        src_threshold: f64,
    },
    /// Keep the best `max(1, floor(total * percent))` pairs by `metric`.
    TopPercent { percent: f64, metric: RankMetric },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::Threshold {
            hex_threshold: DEFAULT_HEX_THRESHOLD,
            src_threshold: DEFAULT_SRC_THRESHOLD,
        }
    }
}

impl SelectionPolicy {
    /// Number of pairs kept by top-percent selection out of `total`.
    pub fn top_count(total: usize, percent: f64) -> usize {
        if total == 0 {
            return 0;
        }
        let count = (total as f64 * percent).floor() as usize;
        count.clamp(1, total)
    }
}

/// Narrow scored pairs down to the suspicious subset.
///
/// Threshold mode keeps the input order. Top-percent mode returns pairs in
/// descending metric order; ties keep their input order.
pub fn select_pairs(pairs: Vec<PairComparison>, policy: &SelectionPolicy) -> Vec<PairComparison> {
    match *policy {
        SelectionPolicy::Threshold {
            hex_threshold,
            src_threshold,
        } => pairs
            .into_iter()
            .filter(|p| p.hex_score > hex_threshold || p.avg_score > src_threshold)
            .collect(),
        SelectionPolicy::TopPercent { percent, metric } => {
            let keep = SelectionPolicy::top_count(pairs.len(), percent);
            let mut ranked = pairs;
            ranked.sort_by(|a, b| metric.value(b).total_cmp(&metric.value(a)));
            ranked.truncate(keep);
            ranked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricBreakdown, ScoringProfile};

    fn pair(name: &str, hex_score: f64, avg_score: f64) -> PairComparison {
        PairComparison {
            student_a: name.to_string(),
            student_b: format!("{}-other", name),
            token_seq_score: avg_score,
            levenshtein_score: avg_score,
            hex_score,
            avg_score,
            hex_metrics: MetricBreakdown::default(),
            profile: ScoringProfile::MeanOfTwo,
            source_evidence: true,
            hex_evidence: true,
        }
    }

    fn names(pairs: &[PairComparison]) -> Vec<&str> {
        pairs.iter().map(|p| p.student_a.as_str()).collect()
    }

    #[test]
    fn test_threshold_is_strict() {
        let policy = SelectionPolicy::Threshold {
            hex_threshold: 0.7,
            src_threshold: 0.8,
        };
        let pairs = vec![
            pair("boundary", 0.7, 0.79),
            pair("hex", 0.71, 0.1),
            pair("src", 0.1, 0.81),
            pair("src-boundary", 0.0, 0.8),
        ];

        let selected = select_pairs(pairs, &policy);
        assert_eq!(names(&selected), vec!["hex", "src"]);
    }

    #[test]
    fn test_top_count() {
        assert_eq!(SelectionPolicy::top_count(40, 0.05), 2);
        assert_eq!(SelectionPolicy::top_count(10, 0.05), 1);
        assert_eq!(SelectionPolicy::top_count(0, 0.05), 0);
        assert_eq!(SelectionPolicy::top_count(5, 2.0), 5);
        assert_eq!(SelectionPolicy::top_count(3, 0.0), 1);
    }

    #[test]
    fn test_top_percent_selects_two_of_forty() {
        let pairs: Vec<_> = (0..40)
            .map(|i| pair(&format!("p{}", i), 0.0, i as f64 / 40.0))
            .collect();
        let policy = SelectionPolicy::TopPercent {
            percent: 0.05,
            metric: RankMetric::Average,
        };

        let selected = select_pairs(pairs, &policy);
        assert_eq!(names(&selected), vec!["p39", "p38"]);
    }

    #[test]
    fn test_top_percent_never_selects_zero() {
        let policy = SelectionPolicy::TopPercent {
            percent: 0.01,
            metric: RankMetric::Average,
        };
        let selected = select_pairs(vec![pair("a", 0.0, 0.2), pair("b", 0.0, 0.3)], &policy);
        assert_eq!(names(&selected), vec!["b"]);
    }

    #[test]
    fn test_top_percent_ties_keep_input_order() {
        let policy = SelectionPolicy::TopPercent {
            percent: 0.5,
            metric: RankMetric::Average,
        };
        let pairs = vec![
            pair("first", 0.0, 0.5),
            pair("second", 0.0, 0.5),
            pair("third", 0.0, 0.5),
            pair("fourth", 0.0, 0.4),
        ];

        let selected = select_pairs(pairs, &policy);
        assert_eq!(names(&selected), vec!["first", "second"]);
    }

    #[test]
    fn test_top_percent_by_metric() {
        let mut low_token = pair("low-token", 0.0, 0.6);
        low_token.token_seq_score = 0.1;
        let mut high_token = pair("high-token", 0.0, 0.5);
        high_token.token_seq_score = 0.9;

        let policy = SelectionPolicy::TopPercent {
            percent: 0.5,
            metric: RankMetric::TokenSeq,
        };
        let selected = select_pairs(vec![low_token, high_token], &policy);
        assert_eq!(names(&selected), vec!["high-token"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(select_pairs(Vec::new(), &SelectionPolicy::default()).is_empty());
        let policy = SelectionPolicy::TopPercent {
            percent: 0.05,
            metric: RankMetric::Average,
        };
        assert!(select_pairs(Vec::new(), &policy).is_empty());
    }
}
