use super::StudentFiles;
use crate::models::SourceKind;
use crate::utils::file::is_path_excluded;
use anyhow::{Context, Result};
use glob::Pattern;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Find every student directory directly under `root` and the files inside it.
///
/// Files placed directly in `root` belong to nobody and are ignored.
/// `max_depth` bounds recursion below each student directory (0 means only
/// the student directory itself).
pub fn discover<P: AsRef<Path>>(
    root: P,
    max_depth: usize,
    exclude_patterns: &[Pattern],
) -> Result<Vec<StudentFiles>> {
    let root = root.as_ref();
    let mut students = Vec::new();
    let mut excluded_count = 0;

    let entries = fs::read_dir(root)
        .with_context(|| format!("Failed to read submissions directory {:?}", root))?;

    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if is_path_excluded(&path, exclude_patterns) {
            excluded_count += 1;
            continue;
        }

        let mut files = Vec::new();
        excluded_count += collect_files(&path, max_depth, exclude_patterns, &mut files);
        files.sort();

        let student = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        students.push(classify(student, files));
    }

    students.sort_by(|a, b| a.student.cmp(&b.student));
    debug!(
        "Discovered {} students ({} items excluded)",
        students.len(),
        excluded_count
    );
    Ok(students)
}

/// Returns the number of excluded entries.
fn collect_files(
    dir: &Path,
    max_depth: usize,
    exclude_patterns: &[Pattern],
    files: &mut Vec<PathBuf>,
) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Error reading directory {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut excluded_count = 0;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();

        if is_path_excluded(&path, exclude_patterns) {
            excluded_count += 1;
            continue;
        }

        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(metadata) if metadata.is_dir() && max_depth > 0 => {
                excluded_count += collect_files(&path, max_depth - 1, exclude_patterns, files);
            }
            _ => continue,
        }
    }
    excluded_count
}

fn classify(student: String, all_files: Vec<PathBuf>) -> StudentFiles {
    let sources = all_files
        .iter()
        .filter(|path| SourceKind::from_path(path).is_some())
        .cloned()
        .collect();
    let hex_files = all_files
        .iter()
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("hex"))
        })
        .cloned()
        .collect();

    StudentFiles {
        student,
        sources,
        hex_files,
        all_files,
    }
}
