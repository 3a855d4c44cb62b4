// Wed Jul 22 2026 - Alex

pub mod summary;

pub use summary::{RunSummary, WorkerSummary};
