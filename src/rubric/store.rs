// Mon Jul 20 2026 - Alex

use crate::input::rubric_file;
use crate::rubric::RubricEntry;
use crate::shm::{SharedState, MAX_RUBRIC_ENTRIES};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

/// View over the arena's rubric slots. Reads and writes go through RAII
/// guards over the reader/writer gate; `correct_entry` and `persist` exist
/// only on the write guard, so writer-only operations cannot be reached
/// without holding write access.
pub struct RubricStore<'a> {
    state: &'a SharedState,
    path: PathBuf,
}

impl<'a> RubricStore<'a> {
    pub fn new(state: &'a SharedState, path: impl Into<PathBuf>) -> Self {
        Self {
            state,
            path: path.into(),
        }
    }

    /// Install parsed entries into the arena. Setup-time only, before any
    /// worker exists; takes no lock.
    pub fn install(&self, entries: &[RubricEntry]) -> usize {
        let count = entries.len().min(MAX_RUBRIC_ENTRIES);
        let slots = self.state.rubric.get();
        for (i, entry) in entries.iter().take(count).enumerate() {
            unsafe {
                (*slots)[i] = entry.to_slot();
            }
        }
        self.state.rubric_len.store(count as u32, Ordering::Release);
        count
    }

    pub fn len(&self) -> usize {
        self.state.rubric_len.load(Ordering::Acquire) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read(&self) -> RubricReadGuard<'a> {
        self.state.rubric_gate.begin_read();
        RubricReadGuard { state: self.state }
    }

    pub fn write(&self) -> RubricWriteGuard<'a, '_> {
        self.state.rubric_gate.begin_write();
        RubricWriteGuard { store: self }
    }

    pub fn reader_count(&self) -> u32 {
        self.state.rubric_gate.reader_count()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct RubricReadGuard<'a> {
    state: &'a SharedState,
}

impl RubricReadGuard<'_> {
    pub fn len(&self) -> usize {
        self.state.rubric_len.load(Ordering::Acquire) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, index: usize) -> RubricEntry {
        debug_assert!(index < self.len());
        let slots = self.state.rubric.get();
        unsafe { RubricEntry::from_slot(&(*slots)[index]) }
    }

    pub fn entries(&self) -> Vec<RubricEntry> {
        (0..self.len()).map(|i| self.entry(i)).collect()
    }
}

impl Drop for RubricReadGuard<'_> {
    fn drop(&mut self) {
        self.state.rubric_gate.end_read();
    }
}

pub struct RubricWriteGuard<'a, 's> {
    store: &'s RubricStore<'a>,
}

impl RubricWriteGuard<'_, '_> {
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn entry(&self, index: usize) -> RubricEntry {
        let slots = self.store.state.rubric.get();
        unsafe { RubricEntry::from_slot(&(*slots)[index]) }
    }

    /// Advance the entry's grading mark and its raw-line byte together.
    /// Returns the (old, new) mark pair for logging.
    pub fn correct_entry(&mut self, index: usize) -> (u8, u8) {
        debug_assert!(index < self.len());
        let slots = self.store.state.rubric.get();
        let mut entry = unsafe { RubricEntry::from_slot(&(*slots)[index]) };
        let change = entry.advance_mark();
        unsafe {
            (*slots)[index] = entry.to_slot();
        }
        change
    }

    /// Rewrite the rubric file from the in-arena entries, still under write
    /// access, so no reader can observe the file ahead of memory.
    pub fn persist(&self) -> std::io::Result<()> {
        let entries: Vec<RubricEntry> = (0..self.len()).map(|i| self.entry(i)).collect();
        rubric_file::write_entries(&self.store.path, &entries)
    }
}

impl Drop for RubricWriteGuard<'_, '_> {
    fn drop(&mut self) {
        self.store.state.rubric_gate.end_write();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::layout::testing::fresh_state;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn sample_entries() -> Vec<RubricEntry> {
        vec![
            RubricEntry::parse("1,X deduct two points").unwrap(),
            RubricEntry::parse("2,Y full credit").unwrap(),
        ]
    }

    #[test]
    fn test_install_and_read_back() {
        let state = fresh_state();
        let dir = TempDir::new().unwrap();
        let store = RubricStore::new(&state, dir.path().join("rubric.txt"));

        assert_eq!(store.install(&sample_entries()), 2);
        let guard = store.read();
        assert_eq!(guard.len(), 2);
        assert_eq!(guard.entry(0).mark, b'X');
        assert_eq!(guard.entry(1).exercise_num, 2);
    }

    #[test]
    fn test_correct_entry_keeps_invariant() {
        let state = fresh_state();
        let dir = TempDir::new().unwrap();
        let store = RubricStore::new(&state, dir.path().join("rubric.txt"));
        store.install(&sample_entries());

        {
            let mut write = store.write();
            let (old, new) = write.correct_entry(0);
            assert_eq!(old, b'X');
            assert_eq!(new, b'Y');
        }

        let guard = store.read();
        let entry = guard.entry(0);
        let offset = crate::rubric::entry::mark_offset(&entry.line).unwrap();
        assert_eq!(entry.line.as_bytes()[offset], entry.mark);
        assert_eq!(entry.mark, b'Y');
    }

    #[test]
    fn test_persist_writes_current_entries() {
        let state = fresh_state();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rubric.txt");
        let store = RubricStore::new(&state, &path);
        store.install(&sample_entries());

        {
            let mut write = store.write();
            write.correct_entry(1);
            write.persist().unwrap();
        }

        let reread = rubric_file::read_entries(&path).unwrap();
        assert_eq!(reread.len(), 2);
        assert_eq!(reread[0].mark, b'X');
        assert_eq!(reread[1].mark, b'Z');
    }

    #[test]
    fn test_writer_waits_for_readers() {
        let state = fresh_state();
        let dir = TempDir::new().unwrap();
        let store = RubricStore::new(&state, dir.path().join("rubric.txt"));
        store.install(&sample_entries());

        let r1 = store.read();
        let r2 = store.read();
        assert_eq!(store.reader_count(), 2);

        let hold = Duration::from_millis(120);
        std::thread::scope(|s| {
            let released_at = Instant::now() + hold;
            s.spawn(move || {
                std::thread::sleep(hold);
                drop(r1);
                drop(r2);
            });

            let write = store.write();
            assert!(Instant::now() >= released_at);
            assert_eq!(store.reader_count(), 0);
            drop(write);
        });
    }
}
