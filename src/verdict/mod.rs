//! Verdict decision for selected pairs.
//!
//! Each pair runs through the same rule cascade independently:
//! 1. Definite match: identical non-empty hex payloads or sources
//! 2. Escalation to the reasoning [`Oracle`] with the original sources
//! 3. Algorithmic fallback when the oracle fails in any way
//! 4. Illegal-submission override for every non-plagiarized outcome
//!
//! Results are ordered by outcome priority, keeping score order within one
//! outcome.

pub mod gemini;
pub mod oracle;

pub use gemini::GeminiOracle;
pub use oracle::{DisabledOracle, Judgement, Oracle, OracleError, StubOracle, parse_judgement};

use crate::models::{Outcome, PairComparison, PairResult, SubmissionRecord, Verdict};
use anyhow::{Context, Result, anyhow};
use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fallback rule: plagiarized iff `avg_score` exceeds this.
pub const FALLBACK_PLAGIARISM_THRESHOLD: f64 = 0.85;
pub const DEFAULT_ORACLE_WORKERS: usize = 4;
pub const EXACT_MATCH_REASON: &str = "exact match";

pub struct VerdictEngine {
    oracle: Arc<dyn Oracle>,
    workers: usize,
    stop: Arc<AtomicBool>,
}

impl VerdictEngine {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self {
            oracle,
            workers: DEFAULT_ORACLE_WORKERS,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bound the number of concurrent oracle calls.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Flag shared with the caller; once set, no new oracle call is started.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Run rules 1-4 for one pair.
    pub fn decide(
        &self,
        comparison: &PairComparison,
        a: &SubmissionRecord,
        b: &SubmissionRecord,
    ) -> Verdict {
        let verdict = if comparison.is_exact_match() {
            Verdict {
                outcome: Outcome::Plagiarized,
                reason: EXACT_MATCH_REASON.to_string(),
                oracle_consulted: false,
            }
        } else if self.stop_requested() {
            Verdict {
                outcome: Outcome::Unknown,
                reason: "analysis stopped before oracle escalation".to_string(),
                oracle_consulted: false,
            }
        } else {
            self.escalate(comparison, a, b)
        };

        apply_illegal_override(verdict, a, b)
    }

    fn escalate(
        &self,
        comparison: &PairComparison,
        a: &SubmissionRecord,
        b: &SubmissionRecord,
    ) -> Verdict {
        match self.oracle.judge(&a.original_source, &b.original_source) {
            Ok(judgement) => {
                debug!(
                    "{} vs {}: oracle says plagiarized={}",
                    a.student, b.student, judgement.is_plagiarized
                );
                Verdict {
                    outcome: if judgement.is_plagiarized {
                        Outcome::Plagiarized
                    } else {
                        Outcome::NotPlagiarized
                    },
                    reason: format!("oracle analysis: {}", judgement.reasoning),
                    oracle_consulted: true,
                }
            }
            Err(e) => {
                warn!("{} vs {}: {}; using fallback rule", a.student, b.student, e);
                fallback_verdict(comparison, &e)
            }
        }
    }

    /// Decide every selected pair and return the results in report order.
    ///
    /// Oracle calls run on a dedicated pool of `workers` threads. A student
    /// missing from `records` is an internal invariant violation.
    pub fn evaluate(
        &self,
        selected: Vec<PairComparison>,
        records: &[SubmissionRecord],
        progress_bar: &ProgressBar,
    ) -> Result<Vec<PairResult>> {
        let by_student: HashMap<&str, &SubmissionRecord> =
            records.iter().map(|r| (r.student.as_str(), r)).collect();

        let lookup = |name: &str| {
            by_student
                .get(name)
                .copied()
                .ok_or_else(|| anyhow!("pair references unknown student {:?}", name))
        };

        let mut ranked = selected;
        ranked.sort_by(|x, y| y.ranking_score().total_cmp(&x.ranking_score()));

        let jobs = ranked
            .into_iter()
            .map(|comparison| -> Result<_> {
                let a = lookup(&comparison.student_a)?;
                let b = lookup(&comparison.student_b)?;
                Ok((comparison, a, b))
            })
            .collect::<Result<Vec<_>>>()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .context("Failed to build oracle worker pool")?;

        let results: Vec<PairResult> = pool.install(|| {
            jobs.into_par_iter()
                .map(|(comparison, a, b)| {
                    let verdict = self.decide(&comparison, a, b);
                    progress_bar.inc(1);
                    PairResult {
                        comparison,
                        verdict,
                    }
                })
                .collect()
        });

        Ok(order_results(results))
    }
}

/// Rule 3: decide from the aggregate score alone. A pair with an empty
/// source side is never plagiarized here.
pub fn fallback_verdict(comparison: &PairComparison, error: &OracleError) -> Verdict {
    let outcome = if comparison.source_evidence
        && comparison.avg_score > FALLBACK_PLAGIARISM_THRESHOLD
    {
        Outcome::Plagiarized
    } else {
        Outcome::NotPlagiarized
    };

    Verdict {
        outcome,
        reason: format!(
            "algorithmic fallback ({}): avg={:.2} (token_seq={:.2}, levenshtein={:.2}), hex={:.2}",
            error,
            comparison.avg_score,
            comparison.token_seq_score,
            comparison.levenshtein_score,
            comparison.hex_score
        ),
        oracle_consulted: true,
    }
}

/// Rule 4: an illegal participant turns any non-plagiarized outcome into
/// `InvalidSubmission`.
pub fn apply_illegal_override(
    verdict: Verdict,
    a: &SubmissionRecord,
    b: &SubmissionRecord,
) -> Verdict {
    if verdict.outcome == Outcome::Plagiarized {
        return verdict;
    }

    let illegal: Vec<&str> = [a, b]
        .iter()
        .filter(|r| r.is_illegal)
        .map(|r| r.student.as_str())
        .collect();

    if illegal.is_empty() {
        return verdict;
    }

    Verdict {
        outcome: Outcome::InvalidSubmission,
        reason: format!("invalid submission: {}", illegal.join(", ")),
        oracle_consulted: verdict.oracle_consulted,
    }
}

/// Stable sort by outcome priority.
pub fn order_results(mut results: Vec<PairResult>) -> Vec<PairResult> {
    results.sort_by_key(|r| r.verdict.outcome.priority());
    results
}
