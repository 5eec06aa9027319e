//! Turning a submissions directory into [`SubmissionRecord`]s.
//!
//! Discovery walks the tree once; every first-level directory is one student.
//! Records are then built in parallel, one task per student, and finally the
//! batch-relative hex checks are applied.

mod discover;
mod process;

use crate::anomaly::{BatchMedian, LengthCensus, apply_hex_checks};
use crate::models::SubmissionRecord;
use std::path::PathBuf;

pub use self::discover::discover;
pub use self::process::build_submissions;

/// Files found for one student, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFiles {
    pub student: String,
    /// `.a51`, `.asm` and `.c` files
    pub sources: Vec<PathBuf>,
    pub hex_files: Vec<PathBuf>,
    /// Every file, including the ones above
    pub all_files: Vec<PathBuf>,
}

/// Second pass: compute the batch median hex length and attach hex anomalies.
pub fn apply_batch_checks(records: &mut [SubmissionRecord]) -> BatchMedian {
    let median = records
        .iter()
        .map(|record| record.hex_length)
        .collect::<LengthCensus>()
        .finish();
    apply_hex_checks(records, &median);
    median
}
