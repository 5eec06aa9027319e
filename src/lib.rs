pub mod anomaly;
pub mod cli;
pub mod compile;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod scanner;
pub mod scoring;
pub mod similarity;
pub mod utils;
pub mod verdict;

pub use models::{AnalysisReport, ExtraData, Header, Output, PairResult, SubmissionRecord};
pub use pipeline::Pipeline;
pub use scanner::{StudentFiles, apply_batch_checks, build_submissions, discover};
