//! Per-submission anomaly detection.
//!
//! Anomalies are non-fatal signals attached to a submission: they never block
//! scoring or verdicts. Two independent rule sets exist:
//! 1. Source rules over the raw text of each source file ([`check_source`])
//! 2. Hex rules over parsed Intel HEX metadata ([`check_hex`])
//!
//! Hex length checks compare every student against the batch median, which is
//! computed in a separate first pass ([`LengthCensus`] → [`BatchMedian`]).

mod hex;
mod median;
mod source;


pub use hex::{
    FORMAT_ERROR_SAMPLES, INSUFFICIENT_DATA_LENGTH, LONG_LENGTH_FACTOR, SHORT_LENGTH_FACTOR,
    check_hex,
};
pub use median::{BatchMedian, LengthCensus};
pub use source::{
    LineStats, MAX_BLANK_RATIO, MAX_COMMENT_RATIO, MIN_CODE_LINES, MIN_INSTRUCTIONS,
    check_source, line_stats,
};

use crate::models::SubmissionRecord;
use rayon::prelude::*;

/// Second anomaly pass: attach hex anomalies to every record using the batch median.
///
/// Each record is written by exactly one task.
pub fn apply_hex_checks(records: &mut [SubmissionRecord], median: &BatchMedian) {
    records.par_iter_mut().for_each(|record| {
        record.hex_anomalies = check_hex(&record.hex_metadata, record.hex_length, median);
    });
}
