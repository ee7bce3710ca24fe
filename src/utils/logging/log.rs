//! Logging utilities
//!
//! Every reference file read is logged when it starts and when it completes,
//! with the row or feature count and the time it took.

use std::path::Path;
use std::time::{Duration, Instant};

/// A reference file read in progress
#[must_use = "call `complete` once the file has been read"]
pub struct FileRead<'a> {
    what: &'static str,
    path: &'a Path,
    start: Instant,
}

impl<'a> FileRead<'a> {
    /// Log the start of reading `what` from `path`
    ///
    /// # Arguments
    /// * `what` - Which dataset is being read
    /// * `path` - Path of the file being read
    pub fn start(what: &'static str, path: &'a Path) -> Self {
        log::info!("Reading {what} from {}", path.display());
        Self {
            what,
            path,
            start: Instant::now(),
        }
    }

    /// Log the completion of the read and return how long it took
    ///
    /// # Arguments
    /// * `items` - Number of rows or features read
    /// * `unit` - What the items are
    pub fn complete(self, items: usize, unit: &str) -> Duration {
        let elapsed = self.start.elapsed();
        log::info!(
            "Read {items} {unit} of {} from {} in {elapsed:?}",
            self.what,
            self.path.display()
        );
        elapsed
    }
}

/// Log a warning, optionally about a specific file
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}
