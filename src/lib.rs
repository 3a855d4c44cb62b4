// Mon Jul 20 2026 - Alex

pub mod config;
pub mod exam;
pub mod input;
pub mod output;
pub mod rubric;
pub mod shm;
pub mod sync;
pub mod ui;
pub mod utils;
pub mod worker;

pub use config::{Config, DelayRange};
pub use exam::{AdvanceOutcome, ExamSequencer, ExamState};
pub use output::RunSummary;
pub use rubric::{RubricEntry, RubricStore};
pub use shm::{SharedArena, SharedState};
pub use worker::{Worker, WorkerOutcome, WorkerPool};
