use super::{Anomaly, PairResult};
use serde::Serialize;

pub const OUTPUT_FORMAT_VERSION: &str = "1.0.0";

#[derive(Serialize, Debug)]
pub struct Output {
    pub headers: Vec<Header>,
    #[serde(flatten)]
    pub report: AnalysisReport,
}

#[derive(Serialize, Debug)]
pub struct Header {
    pub tool_name: String,
    pub tool_version: String,
    pub lab_name: String,
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub duration: f64,
    pub settings: serde_json::Value,
    pub extra_data: ExtraData,
    pub errors: Vec<String>,
    pub output_format_version: String,
}

#[derive(Serialize, Debug)]
pub struct ExtraData {
    pub students_count: usize,
    pub pairs_count: usize,
    pub selected_count: usize,
    pub oracle_consulted_count: usize,
}

/// Everything the reporting side needs from one batch.
#[derive(Serialize, Debug, Default)]
pub struct AnalysisReport {
    /// Selected pairs in final order (outcome priority, then score).
    pub comparisons: Vec<PairResult>,
    pub total_pairs: usize,
    pub illegal_submissions: Vec<IllegalSubmission>,
    pub anomalous_submissions: Vec<AnomalousSubmission>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IllegalSubmission {
    pub student: String,
    pub reason: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AnomalousSubmission {
    pub student: String,
    pub source_anomalies: Vec<Anomaly>,
    pub hex_anomalies: Vec<Anomaly>,
}
