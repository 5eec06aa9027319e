use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Source dialect of a submitted file.
///
/// Selects which anomaly rule set applies and how comments are stripped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Assembly,
    CLike,
}

impl SourceKind {
    /// Classify a file by extension. Returns `None` for non-source files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "a51" | "asm" => Some(Self::Assembly),
            "c" => Some(Self::CLike),
            _ => None,
        }
    }
}

/// Anomaly identifiers. Serialized in SCREAMING_SNAKE_CASE (`FEW_INSTRUCTIONS`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyCode {
    // ── Source ──
    EmptyFile,
    FewInstructions,
    NoOrg,
    NoEnd,
    HighCommentRatio,
    HighBlankRatio,
    FewCodeLines,

    // ── Hex ──
    NoEof,
    FormatErrors,
    ShortLength,
    LongLength,
    InsufficientData,
}

impl AnomalyCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyFile => "EMPTY_FILE",
            Self::FewInstructions => "FEW_INSTRUCTIONS",
            Self::NoOrg => "NO_ORG",
            Self::NoEnd => "NO_END",
            Self::HighCommentRatio => "HIGH_COMMENT_RATIO",
            Self::HighBlankRatio => "HIGH_BLANK_RATIO",
            Self::FewCodeLines => "FEW_CODE_LINES",
            Self::NoEof => "NO_EOF",
            Self::FormatErrors => "FORMAT_ERRORS",
            Self::ShortLength => "SHORT_LENGTH",
            Self::LongLength => "LONG_LENGTH",
            Self::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl fmt::Display for AnomalyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal structural concern about one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub code: AnomalyCode,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, serde_json::Value>>,
}

impl Anomaly {
    pub fn warning(code: AnomalyCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
            details: None,
        }
    }

    pub fn error(code: AnomalyCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Parse metadata reported alongside a normalized hex payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexMetadata {
    pub has_eof: bool,
    pub format_errors: Vec<String>,
    /// Number of valid data (type 00) records.
    pub data_records: usize,
}

impl HexMetadata {
    /// Combine metadata of two hex files belonging to one student.
    ///
    /// EOF counts as present only when both files had one.
    pub fn merge(self, other: HexMetadata) -> HexMetadata {
        let mut format_errors = self.format_errors;
        format_errors.extend(other.format_errors);
        HexMetadata {
            has_eof: self.has_eof && other.has_eof,
            format_errors,
            data_records: self.data_records + other.data_records,
        }
    }
}

/// Everything known about one student's submission.
///
/// Built once during preprocessing; scoring and verdicts only read it.
#[derive(Debug, Clone, Builder, Serialize)]
#[builder(build_fn(skip))]
pub struct SubmissionRecord {
    pub student: String,
    #[builder(default)]
    pub cleaned_source: String,
    #[builder(default)]
    pub compiled_or_raw_asm: String,
    #[builder(default)]
    pub original_source: String,
    #[builder(default)]
    pub hex_payload: String,
    #[builder(default)]
    pub hex_length: usize,
    #[builder(default)]
    pub hex_metadata: HexMetadata,
    #[builder(default)]
    pub is_illegal: bool,
    #[builder(default)]
    pub illegal_reason: Option<String>,
    #[builder(default)]
    pub source_anomalies: Vec<Anomaly>,
    #[builder(default)]
    pub hex_anomalies: Vec<Anomaly>,
}

impl SubmissionRecordBuilder {
    pub fn build(&self) -> Result<SubmissionRecord, String> {
        let hex_payload = self.hex_payload.clone().unwrap_or_default();
        let illegal_reason = self.illegal_reason.clone().flatten();
        Ok(SubmissionRecord {
            student: self.student.clone().ok_or("Missing field: student")?,
            cleaned_source: self.cleaned_source.clone().unwrap_or_default(),
            compiled_or_raw_asm: self.compiled_or_raw_asm.clone().unwrap_or_default(),
            original_source: self.original_source.clone().unwrap_or_default(),
            hex_length: self
                .hex_length
                .unwrap_or_else(|| hex_payload.chars().count()),
            hex_payload,
            hex_metadata: self.hex_metadata.clone().unwrap_or_default(),
            is_illegal: self.is_illegal.unwrap_or(false) || illegal_reason.is_some(),
            illegal_reason,
            source_anomalies: self.source_anomalies.clone().unwrap_or_default(),
            hex_anomalies: self.hex_anomalies.clone().unwrap_or_default(),
        })
    }
}

impl SubmissionRecord {
    pub fn has_anomalies(&self) -> bool {
        !self.source_anomalies.is_empty() || !self.hex_anomalies.is_empty()
    }
}
