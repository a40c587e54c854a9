//! Daemon runtime for the leakwatch water-leak sensor.
//!
//! The crate has three parts:
//!
//! - [`process`] turns a unit of work into a detached background instance.
//!   [`ProcessSupervisor`] enforces a single instance through a PID marker and
//!   offers start, stop, restart and status flows. Detachment sits behind the
//!   [`Daemonizer`] trait so tests can stay in-process.
//! - [`sensor`] hosts the watch loop: a [`SignalLine`] reports activation
//!   edges, and [`WaterSensorService`] forwards them to an [`AlertSink`] at
//!   most once per hysteresis window.
//! - [`telemetry`] installs the rotating file and console log sinks.
//!
//! The CLI wires these together by running [`watch`] as the supervisor's
//! work function.

pub mod process;
pub mod sensor;
pub mod telemetry;

pub use process::{
    Daemonizer, LifecycleOutput, MarkerState, ProcessSupervisor, StdioTarget, StopOutcome,
    SupervisorError, SupervisorSettings, SystemDaemonizer,
};
pub use sensor::{
    AlertSink, AlertThrottle, SignalLine, WaterSensorService, WatchError, WatchSettings, watch,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
