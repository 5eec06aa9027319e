use super::BatchMedian;
use crate::models::{Anomaly, AnomalyCode, HexMetadata};

/// Payloads shorter than this many hex digits carry too little data to compare.
pub const INSUFFICIENT_DATA_LENGTH: usize = 20;
pub const SHORT_LENGTH_FACTOR: f64 = 0.75;
pub const LONG_LENGTH_FACTOR: f64 = 1.25;
/// Maximum number of format error messages copied into anomaly details.
pub const FORMAT_ERROR_SAMPLES: usize = 5;

/// Apply the hex rule set to one student's payload.
///
/// `data_length` is the length of the normalized payload in hex digits. Length
/// deviation is only judged when the batch median is known.
pub fn check_hex(meta: &HexMetadata, data_length: usize, median: &BatchMedian) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    if !meta.has_eof {
        anomalies.push(Anomaly::warning(
            AnomalyCode::NoEof,
            "No end-of-file record found",
        ));
    }

    if !meta.format_errors.is_empty() {
        let samples: Vec<&str> = meta
            .format_errors
            .iter()
            .take(FORMAT_ERROR_SAMPLES)
            .map(String::as_str)
            .collect();
        anomalies.push(
            Anomaly::error(
                AnomalyCode::FormatErrors,
                format!("{} malformed record line(s)", meta.format_errors.len()),
            )
            .with_detail("count", meta.format_errors.len())
            .with_detail("samples", samples),
        );
    }

    if median.is_known() {
        let median_value = median.value();
        let length = data_length as f64;
        let lower = SHORT_LENGTH_FACTOR * median_value;
        let upper = LONG_LENGTH_FACTOR * median_value;

        if length < lower {
            anomalies.push(
                Anomaly::warning(
                    AnomalyCode::ShortLength,
                    format!(
                        "Hex data length {} is {:.0}% of the batch median {:.1}",
                        data_length,
                        length / median_value * 100.0,
                        median_value
                    ),
                )
                .with_detail("length", data_length)
                .with_detail("median", median_value),
            );
        } else if length > upper {
            anomalies.push(
                Anomaly::warning(
                    AnomalyCode::LongLength,
                    format!(
                        "Hex data length {} is {:.0}% of the batch median {:.1}",
                        data_length,
                        length / median_value * 100.0,
                        median_value
                    ),
                )
                .with_detail("length", data_length)
                .with_detail("median", median_value),
            );
        }
    }

    if data_length < INSUFFICIENT_DATA_LENGTH {
        anomalies.push(
            Anomaly::error(
                AnomalyCode::InsufficientData,
                format!(
                    "Only {} hex digits of data (expected at least {})",
                    data_length, INSUFFICIENT_DATA_LENGTH
                ),
            )
            .with_detail("length", data_length),
        );
    }

    anomalies
}
