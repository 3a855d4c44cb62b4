// Mon Jul 20 2026 - Alex

pub mod entry;
pub mod store;

pub use entry::RubricEntry;
pub use store::{RubricReadGuard, RubricStore, RubricWriteGuard};
