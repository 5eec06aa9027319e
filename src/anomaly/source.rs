use crate::models::{Anomaly, AnomalyCode, SourceKind};
use std::collections::HashSet;

pub const MIN_INSTRUCTIONS: usize = 10;
pub const MIN_CODE_LINES: usize = 5;
pub const MAX_COMMENT_RATIO: f64 = 0.8;
pub const MAX_BLANK_RATIO: f64 = 0.5;

/// Line classification of one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineStats {
    pub total_lines: usize,
    pub blank_lines: usize,
    pub comment_lines: usize,
    pub code_lines: usize,
    /// Lowercased mnemonics in file order (assembly only).
    pub mnemonics: Vec<String>,
}

impl LineStats {
    pub fn comment_ratio(&self) -> f64 {
        ratio(self.comment_lines, self.total_lines)
    }

    pub fn blank_ratio(&self) -> f64 {
        ratio(self.blank_lines, self.total_lines)
    }

    fn has_mnemonic(&self, mnemonic: &str) -> bool {
        self.mnemonics.iter().any(|m| m == mnemonic)
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Whether a trimmed, non-blank line is a comment. `in_block` carries an
/// open C `/* */` block from one line to the next.
fn is_comment_line(line: &str, kind: SourceKind, in_block: &mut bool) -> bool {
    match kind {
        SourceKind::Assembly => line.starts_with(';'),
        SourceKind::CLike => {
            if *in_block {
                return match line.find("*/") {
                    Some(end) => {
                        *in_block = false;
                        line[end + 2..].trim().is_empty()
                    }
                    None => true,
                };
            }

            if line.starts_with("//") {
                return true;
            }

            if let Some(rest) = line.strip_prefix("/*") {
                return match rest.find("*/") {
                    Some(end) => {
                        let tail = rest[end + 2..].trim();
                        tail.is_empty() || tail.starts_with("//")
                    }
                    None => {
                        *in_block = true;
                        true
                    }
                };
            }

            // Code followed by a block comment that runs past this line
            if let Some(open) = line.rfind("/*")
                && !line[open + 2..].contains("*/")
            {
                *in_block = true;
            }
            false
        }
    }
}

/// Mnemonic of an assembly code line: the first word after dropping a trailing
/// `;` comment and a leading `label:`. Label-only lines have none.
fn assembly_mnemonic(line: &str) -> Option<String> {
    let code = line.split(';').next().unwrap_or_default();
    let mut words = code.split_whitespace();
    let mut first = words.next()?;

    if let Some(colon) = first.find(':') {
        let rest = &first[colon + 1..];
        first = if rest.is_empty() { words.next()? } else { rest };
    }

    Some(first.to_ascii_lowercase())
}

/// Classify every line of a source file.
pub fn line_stats(text: &str, kind: SourceKind) -> LineStats {
    let mut stats = LineStats::default();
    let mut in_block = false;

    for line in text.lines() {
        stats.total_lines += 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            stats.blank_lines += 1;
        } else if is_comment_line(trimmed, kind, &mut in_block) {
            stats.comment_lines += 1;
        } else {
            stats.code_lines += 1;
            if kind == SourceKind::Assembly
                && let Some(mnemonic) = assembly_mnemonic(trimmed)
            {
                stats.mnemonics.push(mnemonic);
            }
        }
    }

    stats
}

/// Apply the source rule set to one file.
///
/// C-family files skip the assembly-specific instruction and directive checks.
pub fn check_source(text: &str, kind: SourceKind) -> Vec<Anomaly> {
    let stats = line_stats(text, kind);

    if stats.total_lines == 0 {
        return vec![Anomaly::error(AnomalyCode::EmptyFile, "Source file is empty")];
    }

    let mut anomalies = Vec::new();

    if kind == SourceKind::Assembly {
        let instruction_count = stats.mnemonics.len();
        if instruction_count < MIN_INSTRUCTIONS {
            anomalies.push(
                Anomaly::warning(
                    AnomalyCode::FewInstructions,
                    format!(
                        "Only {} instructions found (expected at least {})",
                        instruction_count, MIN_INSTRUCTIONS
                    ),
                )
                .with_detail("instruction_count", instruction_count)
                .with_detail("unique_instructions", unique_count(&stats.mnemonics)),
            );
        }

        if !stats.has_mnemonic("org") {
            anomalies.push(Anomaly::warning(
                AnomalyCode::NoOrg,
                "Missing ORG directive",
            ));
        }

        if !stats.has_mnemonic("end") {
            anomalies.push(Anomaly::warning(
                AnomalyCode::NoEnd,
                "Missing END directive",
            ));
        }
    }

    let comment_ratio = stats.comment_ratio();
    if comment_ratio > MAX_COMMENT_RATIO {
        anomalies.push(
            Anomaly::warning(
                AnomalyCode::HighCommentRatio,
                format!("Comment lines make up {:.0}% of the file", comment_ratio * 100.0),
            )
            .with_detail("comment_lines", stats.comment_lines)
            .with_detail("total_lines", stats.total_lines),
        );
    }

    let blank_ratio = stats.blank_ratio();
    if blank_ratio > MAX_BLANK_RATIO {
        anomalies.push(
            Anomaly::warning(
                AnomalyCode::HighBlankRatio,
                format!("Blank lines make up {:.0}% of the file", blank_ratio * 100.0),
            )
            .with_detail("blank_lines", stats.blank_lines)
            .with_detail("total_lines", stats.total_lines),
        );
    }

    if stats.code_lines < MIN_CODE_LINES {
        anomalies.push(
            Anomaly::error(
                AnomalyCode::FewCodeLines,
                format!(
                    "Only {} lines of code (expected at least {})",
                    stats.code_lines, MIN_CODE_LINES
                ),
            )
            .with_detail("code_lines", stats.code_lines),
        );
    }

    anomalies
}

fn unique_count(mnemonics: &[String]) -> usize {
    mnemonics.iter().collect::<HashSet<_>>().len()
}
