// Mon Jul 20 2026 - Alex

pub mod sequencer;
pub mod state;

pub use sequencer::{AdvanceOutcome, ExamSequencer, SequencerError};
pub use state::ExamState;
