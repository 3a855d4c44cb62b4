// Wed Jul 22 2026 - Alex

pub mod logging;

pub use logging::LoggingUtils;
