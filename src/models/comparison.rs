use serde::{Deserialize, Serialize};
use std::fmt;

/// How per-metric scores are folded into the aggregate source and hex scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringProfile {
    /// `avg_score` is the mean of the two source metrics, `hex_score` is the
    /// edit-distance ratio of the payloads.
    #[default]
    MeanOfTwo,
    /// `avg_score` and `hex_score` are the maximum over both metrics; a side
    /// with no text scores 0.0.
    MaxOfMetrics,
}

/// Raw metric values for one compared text pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricBreakdown {
    pub token_seq: f64,
    pub levenshtein: f64,
}

impl MetricBreakdown {
    pub fn mean(&self) -> f64 {
        (self.token_seq + self.levenshtein) / 2.0
    }

    pub fn max(&self) -> f64 {
        self.token_seq.max(self.levenshtein)
    }
}

/// Similarity scores of one unordered student pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairComparison {
    pub student_a: String,
    pub student_b: String,
    pub token_seq_score: f64,
    pub levenshtein_score: f64,
    pub hex_score: f64,
    pub avg_score: f64,
    pub hex_metrics: MetricBreakdown,
    pub profile: ScoringProfile,
    /// Both compared source texts were non-empty.
    #[serde(skip)]
    pub source_evidence: bool,
    /// Both hex payloads were non-empty.
    #[serde(skip)]
    pub hex_evidence: bool,
}

impl PairComparison {
    /// Identical non-empty hex payloads or identical non-empty sources.
    pub fn is_exact_match(&self) -> bool {
        (self.hex_evidence && self.hex_score == 1.0)
            || (self.source_evidence && self.avg_score == 1.0)
    }

    /// Key used to order suspicious pairs before verdicts are attached.
    pub fn ranking_score(&self) -> f64 {
        self.hex_score.max(self.avg_score)
    }

    pub fn involves(&self, student: &str) -> bool {
        self.student_a == student || self.student_b == student
    }
}

/// Final decision for a selected pair.
///
/// Variant order is the report order: plagiarized pairs first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Plagiarized,
    InvalidSubmission,
    NotPlagiarized,
    Unknown,
}

impl Outcome {
    pub fn priority(&self) -> u8 {
        match self {
            Self::Plagiarized => 0,
            Self::InvalidSubmission => 1,
            Self::NotPlagiarized => 2,
            Self::Unknown => 3,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Plagiarized => "plagiarized",
            Self::InvalidSubmission => "invalid submission",
            Self::NotPlagiarized => "not plagiarized",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Outcome,
    pub reason: String,
    pub oracle_consulted: bool,
}

/// A scored pair together with its verdict, as handed to reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    #[serde(flatten)]
    pub comparison: PairComparison,
    pub verdict: Verdict,
}
