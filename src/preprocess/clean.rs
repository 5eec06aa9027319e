use crate::models::SourceKind;
use once_cell::sync::Lazy;
use regex::Regex;

static ASM_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r";.*").expect("Invalid regex pattern"));

static C_PREPROCESSOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*#.*$").expect("Invalid regex pattern"));

static C_LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//.*").expect("Invalid regex pattern"));

static C_BLOCK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid regex pattern"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

/// Strip comments and normalize whitespace and case.
///
/// The result is a single line of lowercase tokens separated by one space,
/// suitable for both similarity metrics.
pub fn clean_source(content: &str, kind: SourceKind) -> String {
    let stripped = match kind {
        SourceKind::Assembly => ASM_COMMENT.replace_all(content, "").into_owned(),
        SourceKind::CLike => {
            let text = C_PREPROCESSOR.replace_all(content, "");
            let text = C_LINE_COMMENT.replace_all(&text, "");
            C_BLOCK_COMMENT.replace_all(&text, "").into_owned()
        }
    };

    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .to_lowercase()
        .trim()
        .to_string()
}
