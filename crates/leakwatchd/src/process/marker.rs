//! PID marker handling: reading, liveness probing, writing and cleanup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use leakwatch_config::RuntimePaths;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use super::PROCESS_TARGET;
use super::errors::SupervisorError;
use super::files::atomic_write_new;

/// Lifecycle state derived from the marker and the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    /// No usable marker exists.
    NotRunning,
    /// The marker names a live process.
    Running(u32),
    /// The marker names a process that no longer exists.
    Stale(u32),
}

/// PID marker file at a fixed location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidMarker {
    paths: RuntimePaths,
}

impl PidMarker {
    /// Wraps the marker at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: RuntimePaths::new(path),
        }
    }

    /// Location of the marker.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.paths.pid_path()
    }

    /// Returns the recorded PID.
    ///
    /// Missing, unreadable, empty or malformed markers and PID 0 all read as
    /// `None`.
    #[must_use]
    pub fn read(&self) -> Option<u32> {
        let content = fs::read_to_string(self.path()).ok()?;
        content.trim().parse::<u32>().ok().filter(|pid| *pid != 0)
    }

    /// Derives the lifecycle state by probing the recorded PID.
    #[must_use]
    pub fn state(&self) -> MarkerState {
        match self.read() {
            None => MarkerState::NotRunning,
            Some(pid) if is_alive(pid) => MarkerState::Running(pid),
            Some(pid) => MarkerState::Stale(pid),
        }
    }

    /// Records `pid` in a fresh marker and returns a guard that removes it.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::AlreadyRunning`] when another instance
    /// created the marker first, and [`SupervisorError::MarkerWrite`] for any
    /// other IO failure.
    pub fn claim(&self, pid: u32) -> Result<MarkerGuard, SupervisorError> {
        let contents = format!("{pid}\n");
        match atomic_write_new(self.path(), self.paths.marker_dir(), contents.as_bytes()) {
            Ok(()) => {
                info!(
                    target: PROCESS_TARGET,
                    pid,
                    file = %self.path().display(),
                    "pid file written"
                );
                Ok(MarkerGuard {
                    path: self.path().to_path_buf(),
                })
            }
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                let pid = self.read().unwrap_or_default();
                Err(SupervisorError::AlreadyRunning { pid })
            }
            Err(source) => Err(SupervisorError::MarkerWrite {
                path: self.path().to_path_buf(),
                source,
            }),
        }
    }

    /// Deletes the marker; a missing marker is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::MarkerRemove`] when deletion fails.
    pub fn remove(&self) -> Result<(), SupervisorError> {
        match fs::remove_file(self.path()) {
            Ok(()) => {
                debug!(
                    target: PROCESS_TARGET,
                    file = %self.path().display(),
                    "pid file removed"
                );
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SupervisorError::MarkerRemove {
                path: self.path().to_path_buf(),
                source,
            }),
        }
    }
}

/// Removes the marker when dropped.
#[derive(Debug)]
pub struct MarkerGuard {
    path: PathBuf,
}

impl MarkerGuard {
    /// Location of the guarded marker.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

impl Drop for MarkerGuard {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => {
                warn!(
                    target: PROCESS_TARGET,
                    file = %self.path.display(),
                    error = %error,
                    "failed to remove pid file"
                );
            }
            _ => {
                debug!(
                    target: PROCESS_TARGET,
                    file = %self.path.display(),
                    "pid file released"
                );
            }
        }
    }
}

/// Probes `pid` with the null signal.
///
/// Every error, including `EPERM`, is reported as not alive.
#[must_use]
pub fn is_alive(pid: u32) -> bool {
    i32::try_from(pid)
        .ok()
        .filter(|raw| *raw > 0)
        .is_some_and(|raw| kill(Pid::from_raw(raw), None).is_ok())
}
