// Mon Jul 20 2026 - Alex

use crate::rubric::RubricEntry;
use crate::shm::MAX_RUBRIC_ENTRIES;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RubricFileError {
    #[error("Cannot read rubric file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Rubric file {0} contains no usable entries")]
    Empty(String),
}

/// Read and parse the rubric, keeping at most the first
/// `MAX_RUBRIC_ENTRIES` parseable lines. Unparseable lines are logged and
/// skipped.
pub fn read_entries(path: &Path) -> Result<Vec<RubricEntry>, RubricFileError> {
    let text = fs::read_to_string(path).map_err(|source| RubricFileError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut entries = Vec::new();
    for line in text.lines() {
        if entries.len() == MAX_RUBRIC_ENTRIES {
            break;
        }
        match RubricEntry::parse(line) {
            Some(entry) => entries.push(entry),
            None => {
                if !line.trim().is_empty() {
                    log::warn!("skipping malformed rubric line: {:?}", line);
                }
            }
        }
    }

    if entries.is_empty() {
        return Err(RubricFileError::Empty(path.display().to_string()));
    }
    Ok(entries)
}

/// Rewrite the rubric file, one entry per line, in ordinal order.
pub fn write_entries(path: &Path, entries: &[RubricEntry]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    for entry in entries {
        writeln!(file, "{}", entry.line)?;
    }
    Ok(())
}
