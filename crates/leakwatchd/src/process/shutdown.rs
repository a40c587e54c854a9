//! Termination-signal listener for the detached worker.

use std::io;

use signal_hook::consts::signal::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send {
    /// Blocks until shutdown should proceed.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the listener can no longer deliver
    /// notifications.
    fn wait(&mut self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The listener closed before any signal arrived.
    #[error("signal listener closed before shutdown was requested")]
    Closed,
}

/// Shutdown listener that waits for termination signals.
///
/// Handlers are registered on construction, so signals delivered between
/// [`SystemShutdownSignal::install`] and [`ShutdownSignal::wait`] are queued
/// rather than terminating the process.
#[derive(Debug)]
pub struct SystemShutdownSignal {
    signals: Signals,
}

impl SystemShutdownSignal {
    /// Registers handlers for `SIGINT`, `SIGTERM` and `SIGQUIT`.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] when registration fails.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals = Signals::new([SIGINT, SIGTERM, SIGQUIT])
            .map_err(|source| ShutdownError::Install { source })?;
        Ok(Self { signals })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&mut self) -> Result<(), ShutdownError> {
        let signal = self.signals.forever().next().ok_or(ShutdownError::Closed)?;
        info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        Ok(())
    }
}
