//! Error types for the CLI runtime.

use leakwatch_config::ConfigError;
use leakwatchd::{SupervisorError, TelemetryError};
use thiserror::Error;

use crate::action::Action;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("Unknown action: {action} valid choices: {choices}", choices = Action::choices())]
    UnknownAction { action: String },
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Lifecycle(#[from] SupervisorError),
}
