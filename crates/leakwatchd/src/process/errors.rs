//! Defines the unified error surface for daemon supervision.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use super::daemonizer::DaemonizeError;
use super::shutdown::ShutdownError;

/// Boxed error returned by the work function hosted by the supervisor.
pub type WorkError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors surfaced while starting, stopping, or inspecting the daemon.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A live process already holds the PID marker.
    #[error("Daemon running (pid: {pid})")]
    AlreadyRunning {
        /// PID recorded in the existing marker.
        pid: u32,
    },
    /// Detaching from the controlling terminal failed.
    #[error("failed to daemonise: {source}")]
    Detach {
        /// Underlying daemonisation error.
        #[source]
        source: DaemonizeError,
    },
    /// Writing the PID marker failed.
    #[error("failed to write pid file '{path}': {source}")]
    MarkerWrite {
        /// Marker path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Removing the PID marker failed.
    #[error("failed to remove pid file '{path}': {source}")]
    MarkerRemove {
        /// Marker path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Signalling the recorded process failed for a reason other than its
    /// absence.
    #[error("failed to signal daemon pid {pid}: {source}")]
    Signal {
        /// PID that could not be signalled.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// Installing or awaiting the shutdown listener failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// Writing an operator-facing message failed.
    #[error("failed to write lifecycle output: {0}")]
    Output(#[source] io::Error),
    /// The hosted work function failed.
    #[error("daemon work failed: {source}")]
    Work {
        /// Error reported by the work function.
        #[source]
        source: WorkError,
    },
}

impl From<DaemonizeError> for SupervisorError {
    fn from(source: DaemonizeError) -> Self {
        Self::Detach { source }
    }
}

impl From<ShutdownError> for SupervisorError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
