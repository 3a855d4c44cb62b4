// Mon Jul 20 2026 - Alex

use crate::shm::ShmError;
use crate::sync::{ReadWriteGate, SharedSemaphore};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

pub const MAX_RUBRIC_ENTRIES: usize = 5;
pub const MAX_QUESTIONS: usize = 5;
pub const RUBRIC_LINE_CAP: usize = 100;
pub const MAX_EXAMS: usize = 100;
pub const EXAM_PATH_CAP: usize = 64;
pub const MAX_WORKERS: usize = 16;
pub const TERMINATION_SENTINEL: i32 = 9999;

/// One rubric line as stored in the arena. `mark` mirrors the byte inside
/// `line` at the mark column; both are mutated together under write access.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RubricSlot {
    pub exercise_num: i32,
    pub mark: u8,
    pub line_len: u32,
    pub line: [u8; RUBRIC_LINE_CAP],
}

impl RubricSlot {
    pub fn line_str(&self) -> &str {
        std::str::from_utf8(&self.line[..self.line_len as usize]).unwrap_or("")
    }
}

/// The single in-flight exam. Flags are atomics so workers may snapshot
/// them without a lock; every mutation happens under the matching question
/// semaphore (or the loading lock for wholesale resets).
#[repr(C)]
pub struct ExamSlot {
    pub student_number: AtomicI32,
    pub question_done: [AtomicBool; MAX_QUESTIONS],
    pub question_claimed: [AtomicBool; MAX_QUESTIONS],
}

/// Exam path table plus sequencing cursor. Paths are NUL-padded UTF-8,
/// written once during setup before any worker exists.
#[repr(C)]
pub struct SequencerSlot {
    pub paths: UnsafeCell<[[u8; EXAM_PATH_CAP]; MAX_EXAMS]>,
    pub path_count: AtomicU32,
    pub current_index: AtomicU32,
    pub terminate: AtomicBool,
}

#[repr(C)]
pub struct WorkerStats {
    pub questions_marked: AtomicU32,
    pub corrections_made: AtomicU32,
    pub exams_advanced: AtomicU32,
    pub stalled: AtomicBool,
}

/// Fixed-layout shared state mapped into every worker. No pointers, only
/// indices and counters; all growth is bounded by the MAX_* constants.
#[repr(C)]
pub struct SharedState {
    pub rubric: UnsafeCell<[RubricSlot; MAX_RUBRIC_ENTRIES]>,
    pub rubric_len: AtomicU32,
    pub rubric_gate: ReadWriteGate,
    pub exam: ExamSlot,
    pub question_locks: [SharedSemaphore; MAX_QUESTIONS],
    pub sequencer: SequencerSlot,
    pub advance_lock: SharedSemaphore,
    pub active_workers: AtomicU32,
    pub stats: [WorkerStats; MAX_WORKERS],
}

unsafe impl Sync for SharedState {}

impl SharedState {
    /// Zero the region and bring every embedded primitive to its initial
    /// state.
    ///
    /// # Safety
    /// `ptr` must point to writable memory of at least
    /// `size_of::<SharedState>()` bytes that no other process or thread is
    /// touching yet.
    pub unsafe fn init_at(ptr: *mut SharedState) -> Result<(), ShmError> {
        std::ptr::write_bytes(ptr as *mut u8, 0, std::mem::size_of::<SharedState>());
        let state = &*ptr;
        state.rubric_gate.init()?;
        for lock in &state.question_locks {
            lock.init(1)?;
        }
        state.advance_lock.init(1)?;
        Ok(())
    }

    /// Tear down the embedded primitives. Owner-side, after all workers
    /// have been reaped.
    ///
    /// # Safety
    /// No process may still be using the state.
    pub unsafe fn destroy(&self) {
        self.rubric_gate.destroy();
        for lock in &self.question_locks {
            lock.destroy();
        }
        self.advance_lock.destroy();
    }

    pub fn worker_stats(&self, worker_id: usize) -> &WorkerStats {
        &self.stats[worker_id]
    }

    pub fn terminated(&self) -> bool {
        self.sequencer.terminate.load(Ordering::Acquire)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::mem::MaybeUninit;

    /// Heap-allocated arena stand-in for single-process tests. The
    /// primitives are process-shared but work identically across threads.
    pub fn fresh_state() -> Box<SharedState> {
        let boxed: Box<MaybeUninit<SharedState>> = Box::new(MaybeUninit::zeroed());
        unsafe {
            let ptr = Box::into_raw(boxed) as *mut SharedState;
            SharedState::init_at(ptr).unwrap();
            Box::from_raw(ptr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_state_is_clean() {
        let state = testing::fresh_state();
        assert_eq!(state.rubric_len.load(Ordering::Relaxed), 0);
        assert_eq!(state.sequencer.path_count.load(Ordering::Relaxed), 0);
        assert!(!state.terminated());
        for i in 0..MAX_QUESTIONS {
            assert!(!state.exam.question_done[i].load(Ordering::Relaxed));
            assert!(!state.exam.question_claimed[i].load(Ordering::Relaxed));
        }
    }

    #[test]
    fn test_question_locks_start_released() {
        let state = testing::fresh_state();
        for lock in &state.question_locks {
            let guard = lock.try_guard();
            assert!(guard.is_some());
        }
    }
}
