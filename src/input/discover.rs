// Mon Jul 20 2026 - Alex

use crate::shm::MAX_EXAMS;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

static EXAM_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^exam_.*\.txt$").expect("exam filename pattern"));

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Cannot read exam directory {path}: {source}")]
    ReadDir {
        path: String,
        source: std::io::Error,
    },
    #[error("No exam files found in {0}")]
    NoExams(String),
}

/// List the input directory for `exam_*.txt` files, sorted lexicographically
/// by filename, capped at `MAX_EXAMS`.
pub fn discover_exam_files(dir: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| DiscoverError::ReadDir {
        path: dir.display().to_string(),
        source,
    })?;

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| EXAM_FILE_RE.is_match(name))
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .collect();

    if files.is_empty() {
        return Err(DiscoverError::NoExams(dir.display().to_string()));
    }

    files.sort();
    files.truncate(MAX_EXAMS);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("exam_002.txt"), "1002\n").unwrap();
        fs::write(dir.path().join("exam_001.txt"), "1001\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "n/a").unwrap();
        fs::write(dir.path().join("exam_bad.log"), "n/a").unwrap();

        let files = discover_exam_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["exam_001.txt", "exam_002.txt"]);
    }

    #[test]
    fn test_empty_dir_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            discover_exam_files(dir.path()),
            Err(DiscoverError::NoExams(_))
        ));
    }

    #[test]
    fn test_missing_dir_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover_exam_files(&missing),
            Err(DiscoverError::ReadDir { .. })
        ));
    }

    #[test]
    fn test_caps_at_max_exams() {
        let dir = TempDir::new().unwrap();
        for i in 0..(MAX_EXAMS + 10) {
            fs::write(dir.path().join(format!("exam_{:03}.txt", i)), "1\n").unwrap();
        }
        let files = discover_exam_files(dir.path()).unwrap();
        assert_eq!(files.len(), MAX_EXAMS);
    }
}
