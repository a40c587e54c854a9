//! Start, stop, restart and status flows for a single background instance.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use leakwatch_config::DEFAULT_STOP_INTERVAL;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, error, info, warn};

use super::PROCESS_TARGET;
use super::daemonizer::{Daemonizer, DetachSettings, StdioTarget, SystemDaemonizer};
use super::errors::{SupervisorError, WorkError};
use super::marker::{MarkerState, PidMarker};
use super::output::LifecycleOutput;

/// Construction-time settings for a [`ProcessSupervisor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSettings {
    pid_path: PathBuf,
    detach: DetachSettings,
    stop_interval: Duration,
}

impl SupervisorSettings {
    /// Builds settings around the marker path with null stdio, `/` as the
    /// working directory and the default stop interval.
    #[must_use]
    pub fn new(pid_path: impl Into<PathBuf>) -> Self {
        Self {
            pid_path: pid_path.into(),
            detach: DetachSettings::default(),
            stop_interval: DEFAULT_STOP_INTERVAL,
        }
    }

    /// Sets where the detached process sends its standard streams.
    #[must_use]
    pub fn with_stdio(mut self, stdio: StdioTarget) -> Self {
        self.detach = DetachSettings::new(self.detach.work_dir(), stdio);
        self
    }

    /// Sets the delay between interrupt signals sent by `stop`.
    #[must_use]
    pub const fn with_stop_interval(mut self, stop_interval: Duration) -> Self {
        self.stop_interval = stop_interval;
        self
    }

    /// Location of the PID marker.
    #[must_use]
    pub fn pid_path(&self) -> &Path {
        self.pid_path.as_path()
    }

    /// Detachment parameters.
    #[must_use]
    pub const fn detach(&self) -> &DetachSettings {
        &self.detach
    }

    /// Delay between interrupt signals sent by `stop`.
    #[must_use]
    pub const fn stop_interval(&self) -> Duration {
        self.stop_interval
    }
}

/// Result of a successful `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No marker existed; nothing was signalled.
    NotRunning,
    /// The recorded process exited and its marker was removed.
    Stopped {
        /// PID that was stopped.
        pid: u32,
    },
}

/// Manages the lifecycle of one background instance identified by its PID
/// marker.
#[derive(Debug)]
pub struct ProcessSupervisor<D: Daemonizer = SystemDaemonizer> {
    settings: SupervisorSettings,
    marker: PidMarker,
    daemonizer: D,
}

impl ProcessSupervisor<SystemDaemonizer> {
    /// Builds a supervisor that detaches with the system double fork.
    #[must_use]
    pub fn system(settings: SupervisorSettings) -> Self {
        Self::new(settings, SystemDaemonizer::new())
    }
}

impl<D: Daemonizer> ProcessSupervisor<D> {
    /// Builds a supervisor with an explicit detachment backend.
    #[must_use]
    pub fn new(settings: SupervisorSettings, daemonizer: D) -> Self {
        let marker = PidMarker::new(settings.pid_path());
        Self {
            settings,
            marker,
            daemonizer,
        }
    }

    /// Returns the detachment backend.
    #[must_use]
    pub const fn daemonizer(&self) -> &D {
        &self.daemonizer
    }

    /// Detaches, claims the marker, and runs `work` in the detached process.
    ///
    /// The marker is removed on every exit path of `work`. Once detached, this
    /// call returns only when `work` does.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::AlreadyRunning`] when a live instance holds
    /// the marker, [`SupervisorError::Detach`] when detachment fails, marker
    /// IO errors, or [`SupervisorError::Work`] when `work` fails.
    pub fn start<W, E, F, R>(
        &self,
        output: &mut LifecycleOutput<W, E>,
        work: F,
    ) -> Result<(), SupervisorError>
    where
        W: Write,
        E: Write,
        F: FnOnce() -> Result<(), R>,
        R: Into<WorkError>,
    {
        match self.marker.state() {
            MarkerState::Running(pid) => {
                info!(target: PROCESS_TARGET, pid, "refusing to start: daemon already running");
                return Err(SupervisorError::AlreadyRunning { pid });
            }
            MarkerState::Stale(pid) => {
                self.write_stale(output, pid)?;
                output.stderr_line(format_args!("Removing pidfile and launching daemon."))?;
                warn!(
                    target: PROCESS_TARGET,
                    pid,
                    file = %self.marker.path().display(),
                    "removing stale pid file"
                );
                self.marker.remove()?;
            }
            MarkerState::NotRunning => {}
        }

        self.daemonizer.detach(self.settings.detach())?;
        // Detached stderr is usually the null device, so failures go to the log.
        let guard = self.marker.claim(std::process::id()).inspect_err(|error| {
            error!(target: PROCESS_TARGET, %error, "failed to claim pid file");
        })?;
        info!(
            target: PROCESS_TARGET,
            pid = std::process::id(),
            "daemon started"
        );
        let result = work().map_err(|source| SupervisorError::Work {
            source: source.into(),
        });
        drop(guard);
        match &result {
            Ok(()) => info!(target: PROCESS_TARGET, "daemon exiting"),
            Err(error) => error!(target: PROCESS_TARGET, %error, "daemon exiting after failure"),
        }
        result
    }

    /// Interrupts the recorded process until it exits, then removes the
    /// marker.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Signal`] when signalling fails for any
    /// reason other than the process being gone, or
    /// [`SupervisorError::MarkerRemove`] when the marker cannot be deleted.
    pub fn stop<W: Write, E: Write>(
        &self,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<StopOutcome, SupervisorError> {
        let Some(pid) = self.marker.read() else {
            output.stderr_line(format_args!(
                "pidfile {} does not exist. Daemon stopped?",
                self.marker.path().display()
            ))?;
            return Ok(StopOutcome::NotRunning);
        };

        info!(target: PROCESS_TARGET, pid, "stopping daemon");
        loop {
            match interrupt(pid) {
                Ok(()) => {
                    debug!(target: PROCESS_TARGET, pid, "sent SIGINT; waiting for exit");
                    thread::sleep(self.settings.stop_interval());
                }
                Err(Errno::ESRCH) => break,
                Err(source) => return Err(SupervisorError::Signal { pid, source }),
            }
        }
        self.marker.remove()?;
        info!(target: PROCESS_TARGET, pid, "daemon stopped");
        Ok(StopOutcome::Stopped { pid })
    }

    /// Stops any running instance, then starts a new one.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::stop`] and [`Self::start`].
    pub fn restart<W, E, F, R>(
        &self,
        output: &mut LifecycleOutput<W, E>,
        work: F,
    ) -> Result<(), SupervisorError>
    where
        W: Write,
        E: Write,
        F: FnOnce() -> Result<(), R>,
        R: Into<WorkError>,
    {
        self.stop(output)?;
        self.start(output, work)
    }

    /// Reports the current lifecycle state without modifying anything.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Output`] when the report cannot be written.
    pub fn status<W: Write, E: Write>(
        &self,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<MarkerState, SupervisorError> {
        let state = self.marker.state();
        match state {
            MarkerState::NotRunning => output.stderr_line(format_args!("Daemon not running"))?,
            MarkerState::Running(pid) => {
                output.stderr_line(format_args!("Daemon running (pid: {pid})"))?;
            }
            MarkerState::Stale(pid) => self.write_stale(output, pid)?,
        }
        Ok(state)
    }

    fn write_stale<W: Write, E: Write>(
        &self,
        output: &mut LifecycleOutput<W, E>,
        pid: u32,
    ) -> Result<(), SupervisorError> {
        output.stderr_line(format_args!(
            "pidfile {} exists, but pid {pid} is not active.",
            self.marker.path().display()
        ))
    }
}

fn interrupt(pid: u32) -> Result<(), Errno> {
    let raw = i32::try_from(pid).map_err(|_| Errno::ESRCH)?;
    kill(Pid::from_raw(raw), Signal::SIGINT)
}
