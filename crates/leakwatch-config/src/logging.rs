use std::path::{Path, PathBuf};

use crate::defaults::{
    DEFAULT_LOG_BACKUPS, DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER, DEFAULT_LOG_MAX_BYTES,
};

/// Layout of the log sinks.
///
/// The file sink rotates once it would grow past `max_bytes`, keeping
/// `backups` numbered copies. The console sink always writes to standard
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    file: PathBuf,
    max_bytes: u64,
    backups: usize,
    filter: String,
}

impl LogSettings {
    /// Builds settings for the given file and filter using the default
    /// rotation policy.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, filter: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            backups: DEFAULT_LOG_BACKUPS,
            filter: filter.into(),
        }
    }

    /// Overrides the rotation policy.
    #[must_use]
    pub const fn with_rotation(mut self, max_bytes: u64, backups: usize) -> Self {
        self.max_bytes = max_bytes;
        self.backups = backups;
        self
    }

    /// Path of the active log file.
    #[must_use]
    pub fn file(&self) -> &Path {
        self.file.as_path()
    }

    /// Rotation threshold in bytes.
    #[must_use]
    pub const fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Number of rotated files retained.
    #[must_use]
    pub const fn backups(&self) -> usize {
        self.backups
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER)
    }
}
