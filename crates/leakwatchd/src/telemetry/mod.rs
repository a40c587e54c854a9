//! Structured telemetry initialisation.
//!
//! Two sinks are active at once: a size-capped rotating log file and the
//! console on stderr. Both render `timestamp target level message` lines.

mod format;
mod rotating;

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use leakwatch_config::LogSettings;
use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;

pub use rotating::{RotatingFile, RotatingWriter};

use format::LineFormat;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to open the log file.
    #[error("failed to open log file '{path}': {source}")]
    LogFile {
        /// Log file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: only the first invocation installs the
/// global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid, the log file cannot
/// be opened, or another subscriber is already installed.
pub fn initialise(settings: &LogSettings) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(settings))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(settings: &LogSettings) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(settings.filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let file = RotatingFile::open(settings.file(), settings.max_bytes(), settings.backups())
        .map_err(|source| TelemetryError::LogFile {
            path: settings.file().to_path_buf(),
            source,
        })?;

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .event_format(LineFormat::new(UtcTime::rfc_3339()));
    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        // Avoid stray colour codes in non-TTY sinks while keeping colour on
        // interactive terminals.
        .with_ansi(io::stderr().is_terminal())
        .event_format(LineFormat::new(UtcTime::rfc_3339()));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
