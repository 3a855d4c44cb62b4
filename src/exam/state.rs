// Mon Jul 20 2026 - Alex

use crate::shm::{SharedState, MAX_QUESTIONS};
use std::sync::atomic::Ordering;

/// Claim/complete operations on the single in-flight exam. Each question
/// slot has its own semaphore, so five workers can be flipping five
/// different questions with zero contention between them. The semaphore is
/// held only for the flag flips, never across the simulated grading work;
/// the `claimed` flag is what keeps other workers away in between.
pub struct ExamState<'a> {
    state: &'a SharedState,
}

impl<'a> ExamState<'a> {
    pub fn new(state: &'a SharedState) -> Self {
        Self { state }
    }

    pub fn student_number(&self) -> i32 {
        self.state.exam.student_number.load(Ordering::Acquire)
    }

    /// Try to claim the first question that is neither done nor already
    /// claimed, in index order. Never blocks: a contended slot is skipped,
    /// not waited on.
    pub fn try_claim_question(&self) -> Option<usize> {
        for i in 0..MAX_QUESTIONS {
            let Some(_guard) = self.state.question_locks[i].try_guard() else {
                continue;
            };
            let exam = &self.state.exam;
            if !exam.question_done[i].load(Ordering::Acquire)
                && !exam.question_claimed[i].load(Ordering::Acquire)
            {
                exam.question_claimed[i].store(true, Ordering::Release);
                return Some(i);
            }
        }
        None
    }

    /// Flip the claimed question to done. Once set, `question_done` never
    /// reverts for the lifetime of this exam.
    pub fn complete_question(&self, index: usize) {
        let _guard = self.state.question_locks[index].guard();
        self.state.exam.question_done[index].store(true, Ordering::Release);
        self.state.exam.question_claimed[index].store(false, Ordering::Release);
    }

    pub fn all_done(&self) -> bool {
        (0..MAX_QUESTIONS).all(|i| self.state.exam.question_done[i].load(Ordering::Acquire))
    }

    /// Clear every flag for a freshly loaded exam. Callers serialize this
    /// through the exam-loading lock.
    pub(crate) fn reset(&self, student_number: i32) {
        let exam = &self.state.exam;
        exam.student_number.store(student_number, Ordering::Release);
        for i in 0..MAX_QUESTIONS {
            exam.question_done[i].store(false, Ordering::Release);
            exam.question_claimed[i].store(false, Ordering::Release);
        }
    }
}
