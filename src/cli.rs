use crate::models::ScoringProfile;
use crate::scoring::selector::{
    DEFAULT_HEX_THRESHOLD, DEFAULT_SRC_THRESHOLD, DEFAULT_TOP_PERCENT, RankMetric,
    SelectionPolicy,
};
use crate::scoring::ComparisonMode;
use crate::verdict::DEFAULT_ORACLE_WORKERS;
use crate::verdict::gemini::DEFAULT_MODEL;
use anyhow::{Result, ensure};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory with one sub-directory per student
    pub dir_path: String,

    /// Output file path
    #[arg(short, long, default_value = "plagiarism_report.json")]
    pub output_file: String,

    /// Lab name shown in the report (defaults to the directory name)
    #[arg(long)]
    pub lab_name: Option<String>,

    /// Maximum recursion depth below each student directory
    #[arg(short, long, default_value = "50")]
    pub max_depth: usize,

    /// Exclude patterns (glob patterns like "*.bak" or "Objects")
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Hex similarity above which a pair is suspicious
    #[arg(long, default_value_t = DEFAULT_HEX_THRESHOLD)]
    pub hex_threshold: f64,

    /// Source similarity above which a pair is suspicious
    #[arg(long, default_value_t = DEFAULT_SRC_THRESHOLD)]
    pub src_threshold: f64,

    /// How suspicious pairs are selected
    #[arg(long, value_enum, default_value_t = SelectionMode::Threshold)]
    pub selection: SelectionMode,

    /// Fraction of pairs kept with --selection top-percent
    #[arg(long, default_value_t = DEFAULT_TOP_PERCENT)]
    pub top_percent: f64,

    /// Ranking metric for --selection top-percent
    #[arg(long, value_enum, default_value_t = RankMetricArg::Avg)]
    pub rank_metric: RankMetricArg,

    /// How per-metric scores are combined
    #[arg(long, value_enum, default_value_t = ProfileArg::Mean)]
    pub profile: ProfileArg,

    /// Compile C sources with Keil C51 and compare at assembly level
    #[arg(long)]
    pub compile_asm: bool,

    /// Keil C51 installation root (containing BIN/C51.exe)
    #[arg(long)]
    pub keil_path: Option<PathBuf>,

    /// Reasoning oracle consulted for ambiguous pairs
    #[arg(long, value_enum, default_value_t = OracleKind::Gemini)]
    pub oracle: OracleKind,

    /// Model name for --oracle gemini
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub oracle_model: String,

    /// Seconds to wait for one oracle answer
    #[arg(long, default_value_t = 60)]
    pub oracle_timeout: u64,

    /// Maximum concurrent oracle calls
    #[arg(long, default_value_t = DEFAULT_ORACLE_WORKERS)]
    pub oracle_workers: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SelectionMode {
    Threshold,
    TopPercent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RankMetricArg {
    Avg,
    TokenSeq,
    Levenshtein,
}

impl From<RankMetricArg> for RankMetric {
    fn from(arg: RankMetricArg) -> Self {
        match arg {
            RankMetricArg::Avg => RankMetric::Average,
            RankMetricArg::TokenSeq => RankMetric::TokenSeq,
            RankMetricArg::Levenshtein => RankMetric::Levenshtein,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    Mean,
    Max,
}

impl From<ProfileArg> for ScoringProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Mean => ScoringProfile::MeanOfTwo,
            ProfileArg::Max => ScoringProfile::MaxOfMetrics,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    Gemini,
    Stub,
    #[value(name = "none")]
    #[serde(rename = "none")]
    Disabled,
}

/// Validated run configuration. Serialized into the report header.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub dir_path: PathBuf,
    pub output_file: PathBuf,
    pub lab_name: String,
    pub max_depth: usize,
    pub exclude: Vec<String>,
    pub selection: SelectionPolicy,
    pub profile: ScoringProfile,
    pub mode: ComparisonMode,
    pub keil_path: Option<PathBuf>,
    pub oracle: OracleKind,
    pub oracle_model: String,
    pub oracle_timeout_secs: u64,
    pub oracle_workers: usize,
}

fn ensure_unit(name: &str, value: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{} must be between 0 and 1, got {}",
        name,
        value
    );
    Ok(())
}

impl Cli {
    pub fn settings(&self) -> Result<Settings> {
        ensure_unit("--hex-threshold", self.hex_threshold)?;
        ensure_unit("--src-threshold", self.src_threshold)?;
        ensure_unit("--top-percent", self.top_percent)?;
        ensure!(self.oracle_workers >= 1, "--oracle-workers must be at least 1");
        ensure!(self.oracle_timeout >= 1, "--oracle-timeout must be at least 1 second");

        let dir_path = PathBuf::from(&self.dir_path);
        ensure!(
            dir_path.is_dir(),
            "Submissions directory {:?} does not exist or is not a directory",
            dir_path
        );

        let lab_name = self.lab_name.clone().unwrap_or_else(|| {
            dir_path
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
                .unwrap_or_else(|| self.dir_path.clone())
        });

        let selection = match self.selection {
            SelectionMode::Threshold => SelectionPolicy::Threshold {
                hex_threshold: self.hex_threshold,
                src_threshold: self.src_threshold,
            },
            SelectionMode::TopPercent => SelectionPolicy::TopPercent {
                percent: self.top_percent,
                metric: self.rank_metric.into(),
            },
        };

        Ok(Settings {
            dir_path,
            output_file: PathBuf::from(&self.output_file),
            lab_name,
            max_depth: self.max_depth,
            exclude: self.exclude.clone(),
            selection,
            profile: self.profile.into(),
            mode: if self.compile_asm {
                ComparisonMode::CompiledAssembly
            } else {
                ComparisonMode::Source
            },
            keil_path: self.keil_path.clone(),
            oracle: self.oracle,
            oracle_model: self.oracle_model.clone(),
            oracle_timeout_secs: self.oracle_timeout,
            oracle_workers: self.oracle_workers,
        })
    }
}
