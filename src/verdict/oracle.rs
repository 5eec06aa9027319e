//! Reasoning oracle seam.
//!
//! The oracle is an external collaborator consulted for ambiguous pairs. Only
//! its contract matters here: given two source texts it returns a
//! [`Judgement`] or an [`OracleError`]. Every error is handled by the verdict
//! fallback rule and never aborts the batch.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Well-formed oracle answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    pub is_plagiarized: bool,
    pub reasoning: String,
}

/// Failure modes of an oracle call.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleError {
    /// Oracle not configured, credential missing, or client unusable
    Unavailable(String),

    /// No answer within the configured deadline
    Timeout { seconds: u64 },

    /// Network or HTTP failure
    Transport(String),

    /// Answer received but not in the required shape
    Malformed(String),
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "oracle unavailable: {}", msg),
            Self::Timeout { seconds } => write!(f, "oracle timed out after {}s", seconds),
            Self::Transport(msg) => write!(f, "oracle transport error: {}", msg),
            Self::Malformed(msg) => write!(f, "malformed oracle response: {}", msg),
        }
    }
}

impl std::error::Error for OracleError {}

/// A reasoning collaborator that judges whether two sources are plagiarized.
pub trait Oracle: Send + Sync {
    /// Short name used in logs and report headers.
    fn name(&self) -> &str;

    fn judge(&self, source_a: &str, source_b: &str) -> Result<Judgement, OracleError>;
}

/// Returns the same judgement for every pair.
#[derive(Debug, Clone)]
pub struct StubOracle {
    judgement: Judgement,
}

impl StubOracle {
    pub fn new(is_plagiarized: bool, reasoning: impl Into<String>) -> Self {
        Self {
            judgement: Judgement {
                is_plagiarized,
                reasoning: reasoning.into(),
            },
        }
    }
}

impl Default for StubOracle {
    fn default() -> Self {
        Self::new(
            true,
            "Stub analysis: high structural similarity detected (dry run)",
        )
    }
}

impl Oracle for StubOracle {
    fn name(&self) -> &str {
        "stub"
    }

    fn judge(&self, _source_a: &str, _source_b: &str) -> Result<Judgement, OracleError> {
        Ok(self.judgement.clone())
    }
}

/// Stands in when no oracle is configured; every call is `Unavailable`.
#[derive(Debug, Clone)]
pub struct DisabledOracle {
    reason: String,
}

impl DisabledOracle {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Oracle for DisabledOracle {
    fn name(&self) -> &str {
        "disabled"
    }

    fn judge(&self, _source_a: &str, _source_b: &str) -> Result<Judgement, OracleError> {
        Err(OracleError::Unavailable(self.reason.clone()))
    }
}

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid regex pattern"));

/// Parse free-form oracle output into a [`Judgement`].
///
/// Markdown code fences are stripped first; when the remainder is not a JSON
/// object the outermost `{...}` block is tried. Both `is_plagiarized` (bool)
/// and `reasoning` (string) are required.
pub fn parse_judgement(content: &str) -> Result<Judgement, OracleError> {
    let cleaned = content.replace("```json", "").replace("```", "");

    let value: serde_json::Value = match serde_json::from_str(cleaned.trim()) {
        Ok(value) => value,
        Err(_) => {
            let block = JSON_OBJECT.find(&cleaned).ok_or_else(|| {
                OracleError::Malformed(format!("no JSON object in {:?}", preview(content)))
            })?;
            serde_json::from_str(block.as_str())
                .map_err(|e| OracleError::Malformed(format!("invalid JSON: {}", e)))?
        }
    };

    let is_plagiarized = value
        .get("is_plagiarized")
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| OracleError::Malformed("missing boolean `is_plagiarized`".to_string()))?;
    let reasoning = value
        .get("reasoning")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| OracleError::Malformed("missing string `reasoning`".to_string()))?;

    Ok(Judgement {
        is_plagiarized,
        reasoning: reasoning.to_string(),
    })
}

fn preview(content: &str) -> String {
    content.chars().take(100).collect()
}
