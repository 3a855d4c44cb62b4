// Mon Jul 20 2026 - Alex

pub mod arena;
pub mod error;
pub mod layout;

pub use arena::SharedArena;
pub use error::ShmError;
pub use layout::{
    ExamSlot, RubricSlot, SequencerSlot, SharedState, WorkerStats, EXAM_PATH_CAP, MAX_EXAMS,
    MAX_QUESTIONS, MAX_RUBRIC_ENTRIES, MAX_WORKERS, RUBRIC_LINE_CAP, TERMINATION_SENTINEL,
};
