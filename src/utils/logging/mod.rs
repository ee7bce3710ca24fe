//! Logging utilities for output and progress tracking
//!
//! File read logging and the startup spinner.

pub mod log;
pub mod progress;

// Re-export commonly used functions for convenience
pub use self::log::{FileRead, log_warning};
pub use self::progress::{create_spinner, finish_progress_bar};
