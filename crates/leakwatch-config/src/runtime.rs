//! Runtime artefact paths shared by the CLI and the daemon.
//!
//! The only artefact is the PID marker. Both sides must agree on its location
//! so that `stop` and `status` invocations can find the instance a previous
//! `start` left behind.

use std::path::{Path, PathBuf};

use crate::defaults::DEFAULT_PID_PATH;

/// Canonical paths for runtime artefacts written by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pid_path: PathBuf,
}

impl RuntimePaths {
    /// Builds runtime paths around the given PID marker location.
    #[must_use]
    pub fn new(pid_path: impl Into<PathBuf>) -> Self {
        Self {
            pid_path: pid_path.into(),
        }
    }

    /// Path to the PID marker.
    #[must_use]
    pub fn pid_path(&self) -> &Path {
        self.pid_path.as_path()
    }

    /// Directory holding the PID marker.
    ///
    /// Bare file names resolve to the current directory.
    #[must_use]
    pub fn marker_dir(&self) -> &Path {
        match self.pid_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Default for RuntimePaths {
    fn default() -> Self {
        Self::new(DEFAULT_PID_PATH)
    }
}
