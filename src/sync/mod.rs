// Mon Jul 20 2026 - Alex

pub mod semaphore;
pub mod rwgate;

pub use semaphore::{SemGuard, SharedSemaphore};
pub use rwgate::ReadWriteGate;
