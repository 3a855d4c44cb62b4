// Wed Jul 22 2026 - Alex

use crate::config::Config;
use crate::exam::{AdvanceOutcome, ExamSequencer, ExamState};
use crate::rubric::RubricStore;
use crate::shm::SharedState;
use crate::worker::LivenessGuard;
use rand::rngs::ThreadRng;
use rand::Rng;
use std::fmt;
use std::sync::atomic::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    CorrectingRubric,
    Marking,
    Done,
    Stalled,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::CorrectingRubric => write!(f, "CORRECTING_RUBRIC"),
            WorkerState::Marking => write!(f, "MARKING_QUESTIONS"),
            WorkerState::Done => write!(f, "DONE"),
            WorkerState::Stalled => write!(f, "STALLED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    Completed,
    Stalled,
}

/// Per-process marking loop. Alternates between a rubric-correction pass
/// and claiming/marking questions, triggers exam advancement when the
/// current exam is fully marked, and bails out if it makes no forward
/// progress for longer than the stall threshold.
pub struct Worker<'a> {
    id: usize,
    state: &'a SharedState,
    rubric: RubricStore<'a>,
    config: &'a Config,
}

impl<'a> Worker<'a> {
    pub fn new(id: usize, state: &'a SharedState, config: &'a Config) -> Self {
        Self {
            id,
            state,
            rubric: RubricStore::new(state, config.rubric_path.clone()),
            config,
        }
    }

    pub fn run(&self) -> WorkerOutcome {
        log::info!("worker {} started", self.id);

        let mut rng = rand::rng();
        let mut liveness = LivenessGuard::new(self.config.stall_timeout());
        let sequencer = ExamSequencer::new(self.state);
        let exam = ExamState::new(self.state);
        let mut state = WorkerState::CorrectingRubric;

        let outcome = loop {
            match state {
                WorkerState::CorrectingRubric => {
                    if sequencer.terminated() {
                        state = WorkerState::Done;
                        continue;
                    }
                    self.correct_rubric_pass(&mut rng);
                    // The pass simulates seconds of review work; it counts
                    // as activity, not as a stall.
                    liveness.touch();
                    state = WorkerState::Marking;
                }
                WorkerState::Marking => {
                    if sequencer.terminated() {
                        state = WorkerState::Done;
                        continue;
                    }
                    if liveness.stalled() {
                        state = WorkerState::Stalled;
                        continue;
                    }

                    // The index is captured before the completion check so
                    // a concurrent advance is detected under the lock.
                    let observed = sequencer.current_index();
                    match exam.try_claim_question() {
                        Some(question) => {
                            self.mark_question(&exam, question, &mut rng);
                            liveness.touch();
                        }
                        None if exam.all_done() => {
                            self.advance_exam(&sequencer, observed);
                            liveness.touch();
                            state = if sequencer.terminated() {
                                WorkerState::Done
                            } else {
                                WorkerState::CorrectingRubric
                            };
                        }
                        None => {
                            // Peers still hold claims; back off and retry.
                            std::thread::sleep(self.config.retry_sleep());
                        }
                    }
                }
                WorkerState::Done => {
                    log::info!("worker {} finished", self.id);
                    break WorkerOutcome::Completed;
                }
                WorkerState::Stalled => {
                    log::warn!(
                        "worker {} made no progress for {:.1}s, giving up",
                        self.id,
                        liveness.idle_time().as_secs_f64()
                    );
                    self.state.worker_stats(self.id).stalled.store(true, Ordering::Release);
                    break WorkerOutcome::Stalled;
                }
            }
        };

        self.state.active_workers.fetch_sub(1, Ordering::AcqRel);
        outcome
    }

    /// One visit over the rubric under read access. Each entry has a 30%
    /// chance of needing a correction; taking one means stepping out of the
    /// reader role, re-entering as the writer, mutating, persisting, and
    /// stepping back in as a reader.
    fn correct_rubric_pass(&self, rng: &mut ThreadRng) {
        log::info!("worker {} accessing rubric", self.id);

        let mut read = self.rubric.read();
        let len = read.len();
        for i in 0..len {
            std::thread::sleep(self.config.review_delay.sample(rng));

            if rng.random_range(0..100) >= self.config.correction_chance_pct {
                continue;
            }

            drop(read);
            {
                let mut write = self.rubric.write();
                let exercise = write.entry(i).exercise_num;
                let (old, new) = write.correct_entry(i);
                log::info!(
                    "worker {} correcting rubric exercise {} ('{}' -> '{}')",
                    self.id,
                    exercise,
                    old as char,
                    new as char
                );
                if let Err(e) = write.persist() {
                    log::error!("worker {} could not save rubric: {}", self.id, e);
                }
            }
            self.state
                .worker_stats(self.id)
                .corrections_made
                .fetch_add(1, Ordering::AcqRel);
            read = self.rubric.read();
        }
    }

    /// Mark one claimed question. The claim flag keeps peers away while the
    /// grading delay runs; the question's lock itself is only held for the
    /// final flag flip inside `complete_question`.
    fn mark_question(&self, exam: &ExamState<'_>, question: usize, rng: &mut ThreadRng) {
        let student = exam.student_number();
        log::info!(
            "worker {} marking question {} of exam {}",
            self.id,
            question + 1,
            student
        );

        std::thread::sleep(self.config.marking_delay.sample(rng));
        exam.complete_question(question);
        self.state
            .worker_stats(self.id)
            .questions_marked
            .fetch_add(1, Ordering::AcqRel);

        log::info!(
            "worker {} finished marking question {} of exam {}",
            self.id,
            question + 1,
            student
        );
    }

    fn advance_exam(&self, sequencer: &ExamSequencer<'_>, observed: usize) {
        match sequencer.advance(observed) {
            AdvanceOutcome::Loaded(student) => {
                log::info!("worker {} loaded exam {}", self.id, student);
                self.state
                    .worker_stats(self.id)
                    .exams_advanced
                    .fetch_add(1, Ordering::AcqRel);
            }
            AdvanceOutcome::Terminated => {
                log::info!("worker {} reached the end of the exam list", self.id);
            }
            AdvanceOutcome::AlreadyAdvanced => {}
        }
    }
}
