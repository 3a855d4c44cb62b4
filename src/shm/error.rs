// Mon Jul 20 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShmError {
    #[error("Invalid shared region name: {0}")]
    InvalidName(String),
    #[error("Failed to open shared region: {0}")]
    Open(std::io::Error),
    #[error("Failed to size shared region: {0}")]
    Truncate(std::io::Error),
    #[error("Failed to map shared region: {0}")]
    Map(std::io::Error),
    #[error("Failed to initialize shared primitive (errno {0})")]
    PrimitiveInit(i32),
    #[error("Shared region too small: {have} bytes, need {need}")]
    RegionTooSmall { have: usize, need: usize },
}
