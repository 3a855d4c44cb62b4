// Wed Jul 22 2026 - Alex

pub mod liveness;
pub mod pool;
pub mod runner;

pub use liveness::LivenessGuard;
pub use pool::{PoolError, WorkerPool};
pub use runner::{Worker, WorkerOutcome, WorkerState};
