// Mon Jul 20 2026 - Alex

use crate::exam::ExamState;
use crate::shm::{SharedState, EXAM_PATH_CAP, MAX_EXAMS, TERMINATION_SENTINEL};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SequencerError {
    #[error("Exam index {0} is out of range")]
    OutOfRange(usize),
    #[error("Exam path {path} does not fit the {cap}-byte table slot")]
    PathTooLong { path: String, cap: usize },
    #[error("Exam path {0} is not valid UTF-8")]
    PathNotUtf8(String),
    #[error("Cannot open exam file {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("Exam file {0} is missing a student number")]
    MissingStudentNumber(String),
    #[error("Exam file {path} has an invalid student number: {line:?}")]
    InvalidStudentNumber { path: String, line: String },
}

/// Outcome of an advance attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The next exam is loaded; carries its student number.
    Loaded(i32),
    /// No next exam (end of list, or its file vanished); termination set.
    Terminated,
    /// Another worker already advanced past the caller's observed index.
    AlreadyAdvanced,
}

/// Walks the shared exam path table: loads exams, advances exactly once per
/// completed exam, and decides global termination.
pub struct ExamSequencer<'a> {
    state: &'a SharedState,
}

impl<'a> ExamSequencer<'a> {
    pub fn new(state: &'a SharedState) -> Self {
        Self { state }
    }

    /// Copy the discovered paths into the arena table. Setup-time only,
    /// before any worker exists.
    pub fn install_paths(&self, paths: &[PathBuf]) -> Result<usize, SequencerError> {
        let count = paths.len().min(MAX_EXAMS);
        let table = self.state.sequencer.paths.get();
        for (i, path) in paths.iter().take(count).enumerate() {
            let text = path
                .to_str()
                .ok_or_else(|| SequencerError::PathNotUtf8(path.display().to_string()))?;
            let bytes = text.as_bytes();
            // One byte is reserved so a full-length slot still NUL-terminates.
            if bytes.len() >= EXAM_PATH_CAP {
                return Err(SequencerError::PathTooLong {
                    path: text.to_string(),
                    cap: EXAM_PATH_CAP,
                });
            }
            unsafe {
                (&mut (*table)[i])[..bytes.len()].copy_from_slice(bytes);
                (&mut (*table)[i])[bytes.len()..].fill(0);
            }
        }
        self.state
            .sequencer
            .path_count
            .store(count as u32, Ordering::Release);
        Ok(count)
    }

    pub fn path_count(&self) -> usize {
        self.state.sequencer.path_count.load(Ordering::Acquire) as usize
    }

    pub fn current_index(&self) -> usize {
        self.state.sequencer.current_index.load(Ordering::Acquire) as usize
    }

    pub fn terminated(&self) -> bool {
        self.state.terminated()
    }

    fn path_at(&self, index: usize) -> PathBuf {
        let table = self.state.sequencer.paths.get();
        let slot = unsafe { &(*table)[index] };
        let len = slot.iter().position(|&b| b == 0).unwrap_or(EXAM_PATH_CAP);
        PathBuf::from(String::from_utf8_lossy(&slot[..len]).into_owned())
    }

    /// Load the exam at `index`: read its leading student number, reset the
    /// question flags (sentinel excepted, see below), and record the index.
    /// Callers serialize loads through the advance lock except for the
    /// setup-time load of index 0.
    pub fn load(&self, index: usize) -> Result<i32, SequencerError> {
        if index >= self.path_count() {
            return Err(SequencerError::OutOfRange(index));
        }

        let path = self.path_at(index);
        let student = read_student_number(&path)?;

        if student == TERMINATION_SENTINEL {
            // The sentinel exam is never marked. The question flags are
            // left untouched (still all done when arriving via advance) so
            // no claim can slip in between the load and the terminate
            // signal.
            self.state
                .exam
                .student_number
                .store(student, Ordering::Release);
            self.state
                .sequencer
                .current_index
                .store(index as u32, Ordering::Release);
            self.state.sequencer.terminate.store(true, Ordering::Release);
            log::info!("accessing exam {}", student);
            log::info!(
                "termination exam ({}) reached, stopping all workers",
                TERMINATION_SENTINEL
            );
            return Ok(student);
        }

        ExamState::new(self.state).reset(student);
        self.state
            .sequencer
            .current_index
            .store(index as u32, Ordering::Release);

        log::info!("accessing exam {}", student);

        Ok(student)
    }

    /// Advance past a fully marked exam. The caller passes the index it
    /// observed when it saw `all_done()`; if another worker moved the
    /// cursor in the meantime the attempt is a no-op. A missing or
    /// unreadable next exam ends the run instead of crashing it.
    pub fn advance(&self, observed_index: usize) -> AdvanceOutcome {
        let _guard = self.state.advance_lock.guard();

        if self.current_index() != observed_index {
            return AdvanceOutcome::AlreadyAdvanced;
        }

        let next = observed_index + 1;
        if next >= self.path_count() {
            self.state.sequencer.terminate.store(true, Ordering::Release);
            return AdvanceOutcome::Terminated;
        }

        match self.load(next) {
            Ok(student) => AdvanceOutcome::Loaded(student),
            Err(e) => {
                log::warn!("cannot load next exam, ending run: {}", e);
                self.state.sequencer.terminate.store(true, Ordering::Release);
                AdvanceOutcome::Terminated
            }
        }
    }
}

fn read_student_number(path: &Path) -> Result<i32, SequencerError> {
    let file = std::fs::File::open(path).map_err(|source| SequencerError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|source| SequencerError::Open {
            path: path.display().to_string(),
            source,
        })?;

    let trimmed = first_line.trim();
    if trimmed.is_empty() {
        return Err(SequencerError::MissingStudentNumber(
            path.display().to_string(),
        ));
    }
    trimmed
        .parse::<i32>()
        .map_err(|_| SequencerError::InvalidStudentNumber {
            path: path.display().to_string(),
            line: trimmed.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::layout::testing::fresh_state;
    use std::fs;
    use tempfile::TempDir;

    fn exam_dir(students: &[i32]) -> (TempDir, Vec<PathBuf>) {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for (i, student) in students.iter().enumerate() {
            let path = dir.path().join(format!("exam_{:03}.txt", i + 1));
            fs::write(&path, format!("{}\n", student)).unwrap();
            paths.push(path);
        }
        (dir, paths)
    }

    #[test]
    fn test_load_reads_student_number() {
        let state = fresh_state();
        let (_dir, paths) = exam_dir(&[1001, 1002]);
        let seq = ExamSequencer::new(&state);
        seq.install_paths(&paths).unwrap();

        assert_eq!(seq.load(0).unwrap(), 1001);
        assert_eq!(ExamState::new(&state).student_number(), 1001);
        assert_eq!(seq.current_index(), 0);
        assert!(!seq.terminated());
    }

    #[test]
    fn test_load_resets_flags() {
        let state = fresh_state();
        let (_dir, paths) = exam_dir(&[1001, 1002]);
        let seq = ExamSequencer::new(&state);
        seq.install_paths(&paths).unwrap();
        seq.load(0).unwrap();

        let exam = ExamState::new(&state);
        for i in 0..crate::shm::MAX_QUESTIONS {
            exam.complete_question(i);
        }
        assert!(exam.all_done());

        seq.load(1).unwrap();
        assert!(!exam.all_done());
        assert_eq!(exam.student_number(), 1002);
    }

    #[test]
    fn test_load_out_of_range() {
        let state = fresh_state();
        let (_dir, paths) = exam_dir(&[1001]);
        let seq = ExamSequencer::new(&state);
        seq.install_paths(&paths).unwrap();
        assert!(matches!(seq.load(3), Err(SequencerError::OutOfRange(3))));
    }

    #[test]
    fn test_sentinel_sets_termination() {
        let state = fresh_state();
        let (_dir, paths) = exam_dir(&[9999, 1001]);
        let seq = ExamSequencer::new(&state);
        seq.install_paths(&paths).unwrap();

        assert_eq!(seq.load(0).unwrap(), TERMINATION_SENTINEL);
        assert!(seq.terminated());
    }

    #[test]
    fn test_advance_loads_next() {
        let state = fresh_state();
        let (_dir, paths) = exam_dir(&[1001, 1002]);
        let seq = ExamSequencer::new(&state);
        seq.install_paths(&paths).unwrap();
        seq.load(0).unwrap();

        assert_eq!(seq.advance(0), AdvanceOutcome::Loaded(1002));
        assert_eq!(seq.current_index(), 1);
    }

    #[test]
    fn test_advance_past_end_terminates() {
        let state = fresh_state();
        let (_dir, paths) = exam_dir(&[1001]);
        let seq = ExamSequencer::new(&state);
        seq.install_paths(&paths).unwrap();
        seq.load(0).unwrap();

        assert_eq!(seq.advance(0), AdvanceOutcome::Terminated);
        assert!(seq.terminated());
    }

    #[test]
    fn test_stale_observer_cannot_double_advance() {
        let state = fresh_state();
        let (_dir, paths) = exam_dir(&[1001, 1002, 1003]);
        let seq = ExamSequencer::new(&state);
        seq.install_paths(&paths).unwrap();
        seq.load(0).unwrap();

        assert_eq!(seq.advance(0), AdvanceOutcome::Loaded(1002));
        // A second worker that also observed index 0 must not move the
        // cursor again.
        assert_eq!(seq.advance(0), AdvanceOutcome::AlreadyAdvanced);
        assert_eq!(seq.current_index(), 1);
    }

    #[test]
    fn test_vanished_exam_ends_run() {
        let state = fresh_state();
        let (dir, paths) = exam_dir(&[1001, 1002]);
        let seq = ExamSequencer::new(&state);
        seq.install_paths(&paths).unwrap();
        seq.load(0).unwrap();

        fs::remove_file(dir.path().join("exam_002.txt")).unwrap();
        assert_eq!(seq.advance(0), AdvanceOutcome::Terminated);
        assert!(seq.terminated());
    }

    #[test]
    fn test_install_rejects_overlong_path() {
        let state = fresh_state();
        let seq = ExamSequencer::new(&state);
        let long = PathBuf::from(format!("{}/exam_001.txt", "d".repeat(EXAM_PATH_CAP)));
        assert!(matches!(
            seq.install_paths(&[long]),
            Err(SequencerError::PathTooLong { .. })
        ));
    }

    #[test]
    fn test_invalid_student_number() {
        let state = fresh_state();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exam_001.txt");
        fs::write(&path, "not-a-number\n").unwrap();
        let seq = ExamSequencer::new(&state);
        seq.install_paths(&[path]).unwrap();
        assert!(matches!(
            seq.load(0),
            Err(SequencerError::InvalidStudentNumber { .. })
        ));
    }
}
