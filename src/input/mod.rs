// Mon Jul 20 2026 - Alex

pub mod discover;
pub mod rubric_file;

pub use discover::{discover_exam_files, DiscoverError};
pub use rubric_file::RubricFileError;
