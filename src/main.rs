use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{debug, info, warn};
use serde_json::to_string_pretty;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use plagiscope::cli::{Cli, OracleKind, Settings};
use plagiscope::compile::{AsmCompiler, KeilC51};
use plagiscope::models::{AnalysisReport, ExtraData, Header, OUTPUT_FORMAT_VERSION, Output};
use plagiscope::scoring::{ComparisonMode, PairwiseScorer};
use plagiscope::utils::file::compile_exclude_patterns;
use plagiscope::verdict::gemini::API_KEY_ENV;
use plagiscope::verdict::{DisabledOracle, GeminiOracle, Oracle, StubOracle, VerdictEngine};
use plagiscope::{Pipeline, apply_batch_checks, build_submissions, discover};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let progress = init_logging()?;
    let mut settings = cli.settings()?;
    let start_time = Utc::now();
    let mut errors = Vec::new();

    let exclude_patterns = compile_exclude_patterns(&settings.exclude);
    let students = discover(&settings.dir_path, settings.max_depth, &exclude_patterns)?;
    info!(
        "Found {} student submissions in {}",
        students.len(),
        settings.dir_path.display()
    );

    let compiler = init_compiler(&mut settings, &mut errors);

    let progress_bar = create_progress_bar(&progress, students.len());
    let mut records = build_submissions(
        &students,
        compiler.as_ref().map(|c| c as &dyn AsmCompiler),
        &progress_bar,
    )?;
    progress_bar.finish_and_clear();

    let median = apply_batch_checks(&mut records);
    debug!("Batch median hex length: {}", median.value());

    let engine = VerdictEngine::new(init_oracle(&settings, &mut errors))
        .with_workers(settings.oracle_workers);
    let pipeline = Pipeline::new(
        PairwiseScorer::new(settings.mode, settings.profile),
        settings.selection,
        engine,
    )
    .with_progress(progress);
    let report = pipeline.run(&records)?;

    let end_time = Utc::now();
    info!(
        "{} suspicious pairs, {} illegal and {} anomalous submissions",
        report.comparisons.len(),
        report.illegal_submissions.len(),
        report.anomalous_submissions.len()
    );

    let output = create_output(start_time, end_time, &settings, records.len(), errors, report)?;
    write_output(&settings.output_file, &output)?;

    println!("JSON output written to {}", settings.output_file.display());
    Ok(())
}

fn init_logging() -> Result<MultiProgress> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let level = logger.filter();
    let progress = MultiProgress::new();

    LogWrapper::new(progress.clone(), logger)
        .try_init()
        .context("Failed to initialize logging")?;
    log::set_max_level(level);
    Ok(progress)
}

fn init_compiler(settings: &mut Settings, errors: &mut Vec<String>) -> Option<KeilC51> {
    if settings.mode != ComparisonMode::CompiledAssembly {
        return None;
    }

    match KeilC51::locate(settings.keil_path.as_deref()) {
        Ok(compiler) => {
            info!("Using Keil C51 at {}", compiler.root().display());
            Some(compiler)
        }
        Err(e) => {
            warn!("{}; comparing cleaned sources instead", e);
            errors.push(e.to_string());
            settings.mode = ComparisonMode::Source;
            None
        }
    }
}

fn init_oracle(settings: &Settings, errors: &mut Vec<String>) -> Arc<dyn Oracle> {
    let timeout = Duration::from_secs(settings.oracle_timeout_secs);
    match settings.oracle {
        OracleKind::Gemini => match GeminiOracle::from_env(settings.oracle_model.clone(), timeout) {
            Some(oracle) => Arc::new(oracle),
            None => {
                let message = format!("{} is not set; verdicts use the fallback rule", API_KEY_ENV);
                warn!("{}", message);
                errors.push(message);
                Arc::new(DisabledOracle::new(format!("{} not set", API_KEY_ENV)))
            }
        },
        OracleKind::Stub => Arc::new(StubOracle::default()),
        OracleKind::Disabled => Arc::new(DisabledOracle::new("oracle disabled")),
    }
}

fn create_progress_bar(progress: &MultiProgress, total: usize) -> ProgressBar {
    let progress_bar = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} students processed ({eta})",
    ) {
        progress_bar.set_style(style.progress_chars("#>-"));
    }
    progress.add(progress_bar)
}

fn create_output(
    start_time: chrono::DateTime<Utc>,
    end_time: chrono::DateTime<Utc>,
    settings: &Settings,
    students_count: usize,
    errors: Vec<String>,
    report: AnalysisReport,
) -> Result<Output> {
    let duration = (end_time - start_time).num_nanoseconds().unwrap_or(0) as f64 / 1_000_000_000.0;

    let extra_data = ExtraData {
        students_count,
        pairs_count: report.total_pairs,
        selected_count: report.comparisons.len(),
        oracle_consulted_count: report
            .comparisons
            .iter()
            .filter(|result| result.verdict.oracle_consulted)
            .count(),
    };

    Ok(Output {
        headers: vec![Header {
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            lab_name: settings.lab_name.clone(),
            start_timestamp: start_time.to_rfc3339(),
            end_timestamp: end_time.to_rfc3339(),
            duration,
            settings: serde_json::to_value(settings).context("Failed to serialize settings")?,
            extra_data,
            errors,
            output_format_version: OUTPUT_FORMAT_VERSION.to_string(),
        }],
        report,
    })
}

fn write_output(output_file: &Path, output: &Output) -> Result<()> {
    let json_output = to_string_pretty(output).context("Failed to serialize report")?;
    let mut file = File::create(output_file)
        .with_context(|| format!("Failed to create {}", output_file.display()))?;
    file.write_all(json_output.as_bytes())?;
    Ok(())
}
