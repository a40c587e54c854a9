//! Implements the detachment backend for the supervised process.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::stat::{Mode, umask};
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, chdir, dup2, fork, pipe, setsid};
use strum::{Display, FromRepr};
use thiserror::Error;
use tracing::{debug, info};

use super::PROCESS_TARGET;

/// Destination for the standard streams of the detached process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioTarget {
    /// Redirect stdin, stdout and stderr to the null device.
    #[default]
    Null,
    /// Keep stdout and stderr attached to the invoking console.
    Inherit,
}

/// Parameters applied while detaching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachSettings {
    work_dir: PathBuf,
    stdio: StdioTarget,
}

impl DetachSettings {
    /// Builds settings for the given working directory and stream target.
    #[must_use]
    pub fn new(work_dir: impl Into<PathBuf>, stdio: StdioTarget) -> Self {
        Self {
            work_dir: work_dir.into(),
            stdio,
        }
    }

    /// Working directory of the detached process.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        self.work_dir.as_path()
    }

    /// Destination of the standard streams.
    #[must_use]
    pub const fn stdio(&self) -> StdioTarget {
        self.stdio
    }
}

impl Default for DetachSettings {
    fn default() -> Self {
        Self::new("/", StdioTarget::Null)
    }
}

/// Abstraction over detachment strategies.
///
/// On success the implementation returns in the final worker process; every
/// intermediate process has already exited. On failure it returns in the
/// invoking process.
pub trait Daemonizer: Send + Sync {
    /// Detaches the process into the background.
    fn detach(&self, settings: &DetachSettings) -> Result<(), DaemonizeError>;
}

/// System call at which detachment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
#[strum(serialize_all = "snake_case")]
pub enum DetachStep {
    /// Creating the readiness pipe.
    Pipe = 1,
    /// Forking the intermediate or the worker process.
    Fork,
    /// Starting a new session.
    Setsid,
    /// Changing into the working directory.
    #[strum(to_string = "chdir")]
    WorkDir,
    /// Rebinding the standard streams.
    Stdio,
}

/// Errors surfaced by the detachment backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// A detachment system call failed.
    #[error("{step} failed: {source}")]
    System {
        /// Failing step.
        step: DetachStep,
        /// OS error returned by the failing call.
        #[source]
        source: Errno,
    },
    /// The streams for the detached process could not be opened.
    #[error("failed to open detached process streams: {source}")]
    Console {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The readiness report from the worker could not be read.
    #[error("failed to read detached worker report: {source}")]
    Report {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The worker exited without reporting.
    #[error("detached worker exited without reporting readiness")]
    Vanished,
}

const READY: &str = "ready";

/// Daemoniser that performs the UNIX double fork.
///
/// The first child starts a new session and forks again, so the worker is
/// neither a session nor a process-group leader and can never reacquire a
/// controlling terminal. The worker reports readiness, or the step and errno
/// that failed, over a pipe; the invoking process exits only after a ready
/// report and otherwise returns the failure to its caller.
#[derive(Debug, Default)]
pub struct SystemDaemonizer;

impl SystemDaemonizer {
    /// Builds a new system daemoniser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Daemonizer for SystemDaemonizer {
    fn detach(&self, settings: &DetachSettings) -> Result<(), DaemonizeError> {
        info!(
            target: PROCESS_TARGET,
            work_dir = %settings.work_dir().display(),
            stdio = ?settings.stdio(),
            "daemonising into background"
        );
        let streams = WorkerStreams::open(settings.stdio())?;
        let (reader, writer) = pipe().map_err(|source| DaemonizeError::System {
            step: DetachStep::Pipe,
            source,
        })?;
        // SAFETY: the launcher is single-threaded while detaching.
        let forked = unsafe { fork() }.map_err(|source| DaemonizeError::System {
            step: DetachStep::Fork,
            source,
        })?;
        match forked {
            ForkResult::Parent { child } => {
                drop(writer);
                let outcome = await_worker(File::from(reader));
                // The intermediate exits straight after the second fork.
                if let Err(errno) = waitpid(child, None) {
                    debug!(target: PROCESS_TARGET, error = %errno, "intermediate not reaped");
                }
                let worker = outcome?;
                info!(target: PROCESS_TARGET, worker, "daemon detached; launcher exiting");
                exit_now(0)
            }
            ForkResult::Child => {
                drop(reader);
                let mut report = File::from(writer);
                match become_worker(settings, &streams) {
                    Ok(()) => {
                        let ready = format!("{READY} {}\n", std::process::id());
                        if report.write_all(ready.as_bytes()).is_err() {
                            exit_now(1);
                        }
                        drop(report);
                        info!(
                            target: PROCESS_TARGET,
                            pid = std::process::id(),
                            "daemon process detached; continuing in worker"
                        );
                        Ok(())
                    }
                    Err(failure) => {
                        let message = format!("{} {}\n", failure.step as u8, failure.errno as i32);
                        // The launcher sees the closed pipe even if this write fails.
                        let _delivered = report.write_all(message.as_bytes()).is_ok();
                        exit_now(1)
                    }
                }
            }
        }
    }
}

/// Leaves a forked process without running exit handlers.
fn exit_now(code: i32) -> ! {
    // SAFETY: `_exit` only terminates the calling process.
    unsafe { libc::_exit(code) }
}

#[derive(Debug, Clone, Copy)]
struct StepFailure {
    step: DetachStep,
    errno: Errno,
}

impl StepFailure {
    const fn new(step: DetachStep, errno: Errno) -> Self {
        Self { step, errno }
    }
}

/// Runs in the first child; returns only in the worker.
fn become_worker(settings: &DetachSettings, streams: &WorkerStreams) -> Result<(), StepFailure> {
    setsid().map_err(|errno| StepFailure::new(DetachStep::Setsid, errno))?;
    // SAFETY: the first child runs no other threads.
    match unsafe { fork() }.map_err(|errno| StepFailure::new(DetachStep::Fork, errno))? {
        ForkResult::Parent { .. } => exit_now(0),
        ForkResult::Child => {}
    }
    chdir(settings.work_dir()).map_err(|errno| StepFailure::new(DetachStep::WorkDir, errno))?;
    umask(Mode::empty());
    streams
        .redirect()
        .map_err(|errno| StepFailure::new(DetachStep::Stdio, errno))
}

/// Blocks until the worker reports and returns its PID.
fn await_worker(mut report: File) -> Result<u32, DaemonizeError> {
    let mut message = String::new();
    report
        .read_to_string(&mut message)
        .map_err(|source| DaemonizeError::Report { source })?;
    decode_report(&message)
}

fn decode_report(message: &str) -> Result<u32, DaemonizeError> {
    let (head, tail) = message
        .trim()
        .split_once(' ')
        .ok_or(DaemonizeError::Vanished)?;
    if head == READY {
        return tail.parse().map_err(|_| DaemonizeError::Vanished);
    }
    let step = head
        .parse()
        .ok()
        .and_then(DetachStep::from_repr)
        .ok_or(DaemonizeError::Vanished)?;
    let errno = tail.parse().map_err(|_| DaemonizeError::Vanished)?;
    Err(DaemonizeError::System {
        step,
        source: Errno::from_raw(errno),
    })
}

/// Streams bound to the worker's stdin, stdout and stderr.
///
/// Opened before forking so failures reach the invoking console.
#[derive(Debug)]
struct WorkerStreams {
    stdin: File,
    stdout: File,
    stderr: File,
}

impl WorkerStreams {
    fn open(target: StdioTarget) -> Result<Self, DaemonizeError> {
        let stdin = null_device()?;
        let (stdout, stderr) = match target {
            StdioTarget::Null => (null_device()?, null_device()?),
            StdioTarget::Inherit => (
                console_stream(io::stdout().as_fd())?,
                console_stream(io::stderr().as_fd())?,
            ),
        };
        Ok(Self {
            stdin,
            stdout,
            stderr,
        })
    }

    fn redirect(&self) -> Result<(), Errno> {
        dup2(self.stdin.as_raw_fd(), io::stdin().as_raw_fd())?;
        dup2(self.stdout.as_raw_fd(), io::stdout().as_raw_fd())?;
        dup2(self.stderr.as_raw_fd(), io::stderr().as_raw_fd())?;
        Ok(())
    }
}

fn null_device() -> Result<File, DaemonizeError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map_err(|source| DaemonizeError::Console { source })
}

fn console_stream(fd: BorrowedFd<'_>) -> Result<File, DaemonizeError> {
    fd.try_clone_to_owned()
        .map(File::from)
        .map_err(|source| DaemonizeError::Console { source })
}
