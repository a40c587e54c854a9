//! The sensor watch loop and its collaborators.
//!
//! A [`SignalLine`] reports activation edges, an [`AlertSink`] delivers
//! notifications, and [`WaterSensorService`] joins the two through an
//! [`AlertThrottle`]. [`watch`] assembles the production versions and is the
//! work function the daemon runs once detached.

mod alert;
mod service;
mod signal_line;
mod throttle;
mod watch;

pub use alert::{AlertSink, DeliveryError, HttpAlertSink};
pub use service::{ActivationOutcome, ActivationResponder, ServiceError, WaterSensorService};
pub use signal_line::{ActivationCallback, GpioSignalLine, SignalLine, SignalLineError};
pub use throttle::AlertThrottle;
pub use watch::{WatchError, WatchSettings, watch};

pub(crate) const SENSOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::sensor");
