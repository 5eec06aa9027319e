mod comparison;
mod output;
mod submission;

pub use comparison::{
    MetricBreakdown, Outcome, PairComparison, PairResult, ScoringProfile, Verdict,
};
pub use output::{
    AnalysisReport, AnomalousSubmission, ExtraData, Header, IllegalSubmission,
    OUTPUT_FORMAT_VERSION, Output,
};
pub use submission::{
    Anomaly, AnomalyCode, HexMetadata, Severity, SourceKind, SubmissionRecord,
    SubmissionRecordBuilder,
};
