//! Shared configuration for the leakwatch daemon and its CLI.
//!
//! The crate owns the defaults both binaries agree on (PID marker location,
//! log sink layout, GPIO pin) together with the typed values handed to the
//! daemon at start time. Configuration is supplied once, on the command line
//! or through the environment, and is immutable after the process detaches.

mod defaults;
mod logging;
mod runtime;
mod sensor;

pub use defaults::{
    DEFAULT_ALERT_TIMEOUT, DEFAULT_GPIO_PIN, DEFAULT_HYSTERESIS, DEFAULT_LOG_BACKUPS,
    DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER, DEFAULT_LOG_MAX_BYTES, DEFAULT_PID_PATH,
    DEFAULT_STOP_INTERVAL,
};
pub use logging::LogSettings;
pub use runtime::RuntimePaths;
pub use sensor::{ConfigError, RequiredField, SensorConfig};
