use super::StudentFiles;
use crate::anomaly::check_source;
use crate::compile::AsmCompiler;
use crate::models::{HexMetadata, SourceKind, SubmissionRecord, SubmissionRecordBuilder};
use crate::preprocess::{clean_source, parse_intel_hex};
use anyhow::{Error, Result};
use content_inspector::inspect;
use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const NO_FILES_REASON: &str = "no files found";
pub const NO_HEX_REASON: &str = "no valid hex file found";

/// Build one record per student, in parallel.
///
/// With a compiler, C sources are additionally compiled to assembly; a
/// failing compile only drops that file from the assembly text.
pub fn build_submissions(
    students: &[StudentFiles],
    compiler: Option<&dyn AsmCompiler>,
    progress_bar: &ProgressBar,
) -> Result<Vec<SubmissionRecord>> {
    students
        .par_iter()
        .map(|files| {
            let record = build_record(files, compiler);
            progress_bar.inc(1);
            record
        })
        .collect()
}

fn build_record(files: &StudentFiles, compiler: Option<&dyn AsmCompiler>) -> Result<SubmissionRecord> {
    let mut cleaned_parts = Vec::new();
    let mut original_parts = Vec::new();
    let mut compiled_parts = Vec::new();
    let mut assembly_parts = Vec::new();
    let mut source_anomalies = Vec::new();

    for path in &files.sources {
        let Some(kind) = SourceKind::from_path(path) else {
            continue;
        };
        let Some(content) = read_text(path) else {
            continue;
        };
        let file_name = display_name(path);

        let cleaned = clean_source(&content, kind);
        source_anomalies.extend(
            check_source(&content, kind)
                .into_iter()
                .map(|anomaly| anomaly.with_detail("file", file_name.clone())),
        );
        original_parts.push(format!("--- {} ---\n{}", file_name, content));

        if let Some(compiler) = compiler {
            match kind {
                SourceKind::CLike => match compiler.compile(path) {
                    Ok(asm) => {
                        debug!("{}: compiled {} with {}", files.student, file_name, compiler.name());
                        compiled_parts.push(clean_source(&asm, SourceKind::Assembly));
                    }
                    Err(e) => warn!("{}: failed to compile {}: {}", files.student, file_name, e),
                },
                SourceKind::Assembly => assembly_parts.push(cleaned.clone()),
            }
        }
        cleaned_parts.push(cleaned);
    }
    compiled_parts.extend(assembly_parts);

    let (hex_payload, hex_metadata) = read_hex_files(files);

    let mut reasons = Vec::new();
    if files.sources.is_empty() {
        reasons.push(missing_source_reason(files));
    }
    if hex_payload.is_empty() {
        reasons.push(NO_HEX_REASON.to_string());
    }
    let illegal_reason = (!reasons.is_empty()).then(|| reasons.join(" | "));

    let mut builder = SubmissionRecordBuilder::default();
    builder
        .student(files.student.clone())
        .cleaned_source(join_parts(&cleaned_parts))
        .compiled_or_raw_asm(join_parts(&compiled_parts))
        .original_source(original_parts.join("\n\n"))
        .hex_payload(hex_payload)
        .hex_metadata(hex_metadata)
        .illegal_reason(illegal_reason)
        .source_anomalies(source_anomalies);
    builder.build().map_err(Error::msg)
}

fn read_hex_files(files: &StudentFiles) -> (String, HexMetadata) {
    let mut payload = String::new();
    let mut metadata: Option<HexMetadata> = None;

    for path in &files.hex_files {
        let Some(content) = read_text(path) else {
            continue;
        };
        let parsed = parse_intel_hex(&content);
        for error in &parsed.meta.format_errors {
            debug!("{}: {}: {}", files.student, display_name(path), error);
        }
        payload.push_str(&parsed.payload);
        metadata = Some(match metadata {
            Some(merged) => merged.merge(parsed.meta),
            None => parsed.meta,
        });
    }

    (payload, metadata.unwrap_or_default())
}

fn missing_source_reason(files: &StudentFiles) -> String {
    if files.all_files.is_empty() {
        return NO_FILES_REASON.to_string();
    }

    let extensions: BTreeSet<String> = files
        .all_files
        .iter()
        .map(|path| {
            path.extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_else(|| "(no extension)".to_string())
        })
        .collect();

    format!(
        "found {} files, but .a51, .asm or .c source is required",
        extensions.into_iter().collect::<Vec<_>>().join(", ")
    )
}

fn read_text(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(buffer) if inspect(&buffer).is_binary() => {
            warn!("Skipping binary file {}", path.display());
            None
        }
        Ok(buffer) => Some(String::from_utf8_lossy(&buffer).into_owned()),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn join_parts(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::CompileError;
    use crate::models::AnomalyCode;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const HEX: &str = ":03000000020800F3\n:00000001FF\n";

    struct FakeCompiler;

    impl AsmCompiler for FakeCompiler {
        fn name(&self) -> &str {
            "fake"
        }

        fn compile(&self, c_file: &Path) -> Result<String, CompileError> {
            if c_file.ends_with("broken.c") {
                return Err(CompileError::Failed {
                    status: "exit status: 2".to_string(),
                    output: String::new(),
                });
            }
            Ok("MOV A,#01H ; compiled\nRET".to_string())
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn student(name: &str, sources: Vec<PathBuf>, hex_files: Vec<PathBuf>, extra: Vec<PathBuf>) -> StudentFiles {
        let mut all_files: Vec<PathBuf> = sources.iter().chain(&hex_files).chain(&extra).cloned().collect();
        all_files.sort();
        StudentFiles {
            student: name.to_string(),
            sources,
            hex_files,
            all_files,
        }
    }

    #[test]
    fn test_build_record_combines_sources() {
        let temp = TempDir::new().unwrap();
        let asm = write(temp.path(), "a.a51", "ORG 0\nMOV A, #1 ; load\nEND\n");
        let c = write(temp.path(), "b.c", "// entry\nvoid main(void) {}\n");
        let hex = write(temp.path(), "a.hex", HEX);

        let files = student("alice", vec![asm, c], vec![hex], vec![]);
        let record = build_record(&files, None).unwrap();

        assert_eq!(record.student, "alice");
        assert_eq!(record.cleaned_source, "org 0 mov a, #1 end void main(void) {}");
        assert!(record.original_source.starts_with("--- a.a51 ---\nORG 0"));
        assert!(record.original_source.contains("\n\n--- b.c ---\n// entry"));
        assert_eq!(record.compiled_or_raw_asm, "");
        assert_eq!(record.hex_payload, "020800");
        assert_eq!(record.hex_length, 6);
        assert!(record.hex_metadata.has_eof);
        assert!(!record.is_illegal);
        assert!(record.illegal_reason.is_none());
    }

    #[test]
    fn test_build_record_tags_source_anomalies_with_file() {
        let temp = TempDir::new().unwrap();
        let asm = write(temp.path(), "tiny.a51", "NOP\n");
        let hex = write(temp.path(), "tiny.hex", HEX);

        let record = build_record(&student("bob", vec![asm], vec![hex], vec![]), None).unwrap();

        let few = record
            .source_anomalies
            .iter()
            .find(|a| a.code == AnomalyCode::FewInstructions)
            .unwrap();
        assert_eq!(few.details.as_ref().unwrap()["file"], "tiny.a51");
        assert!(record.hex_anomalies.is_empty());
    }

    #[test]
    fn test_build_record_flags_missing_source_and_hex() {
        let temp = TempDir::new().unwrap();
        let notes = write(temp.path(), "report.pdf", "text");
        let readme = write(temp.path(), "README", "text");

        let record = build_record(&student("carol", vec![], vec![], vec![notes, readme]), None).unwrap();

        assert!(record.is_illegal);
        assert_eq!(
            record.illegal_reason.as_deref(),
            Some("found (no extension), .pdf files, but .a51, .asm or .c source is required | no valid hex file found")
        );
    }

    #[test]
    fn test_build_record_with_no_files() {
        let record = build_record(&student("dave", vec![], vec![], vec![]), None).unwrap();
        assert_eq!(
            record.illegal_reason.as_deref(),
            Some("no files found | no valid hex file found")
        );
    }

    #[test]
    fn test_build_record_with_compiler() {
        let temp = TempDir::new().unwrap();
        let c = write(temp.path(), "main.c", "void main(void) {}\n");
        let broken = write(temp.path(), "broken.c", "void f(void) {\n");
        let asm = write(temp.path(), "util.a51", "ACALL DELAY ; wait\n");
        let hex = write(temp.path(), "main.hex", HEX);

        let files = student("erin", vec![broken, c, asm], vec![hex], vec![]);
        let record = build_record(&files, Some(&FakeCompiler)).unwrap();

        assert_eq!(record.compiled_or_raw_asm, "mov a,#01h ret acall delay");
    }

    #[test]
    fn test_build_submissions_one_record_per_student() {
        let temp = TempDir::new().unwrap();
        let asm = write(temp.path(), "x.a51", "NOP\n");
        let students = vec![
            student("s1", vec![asm.clone()], vec![], vec![]),
            student("s2", vec![asm], vec![], vec![]),
        ];

        let records = build_submissions(&students, None, &ProgressBar::hidden()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.student.as_str()).collect();
        assert_eq!(names, vec!["s1", "s2"]);
        assert!(records.iter().all(|r| r.is_illegal));
    }
}
