//! Daemon lifecycle management.
//!
//! - [`daemonizer`] detaches the process from its terminal.
//! - [`marker`] reads, probes and claims the PID marker.
//! - [`supervisor`] implements the start, stop, restart and status flows.
//! - [`shutdown`] waits for termination signals inside the detached worker.

pub mod daemonizer;
mod errors;
mod files;
pub mod marker;
mod output;
pub mod shutdown;
pub mod supervisor;

pub use daemonizer::{
    DaemonizeError, Daemonizer, DetachSettings, DetachStep, StdioTarget, SystemDaemonizer,
};
pub use errors::{SupervisorError, WorkError};
pub use marker::{MarkerGuard, MarkerState, PidMarker, is_alive};
pub use output::LifecycleOutput;
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use supervisor::{ProcessSupervisor, StopOutcome, SupervisorSettings};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
