//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;
use leakwatch_config::{
    DEFAULT_GPIO_PIN, DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER, DEFAULT_PID_PATH, LogSettings,
    SensorConfig,
};
use leakwatchd::{StdioTarget, SupervisorSettings, WatchSettings};

use crate::errors::AppError;

/// Command-line interface for the leakwatch sensor daemon.
#[derive(Parser, Debug)]
#[command(name = "leakwatch", version, about = "IOT water sensor daemon")]
pub(crate) struct Cli {
    /// Lifecycle action: start, stop, restart or status.
    #[arg(value_name = "ACTION")]
    pub(crate) action: String,
    /// The URL of the serverless hub.
    #[arg(
        short = 's',
        long = "serverless-hub",
        alias = "serverlessHub",
        env = "LEAKWATCH_HUB"
    )]
    pub(crate) hub: Option<String>,
    /// The specific ID of the client connecting to the hub.
    #[arg(short = 'c', long = "client", env = "LEAKWATCH_CLIENT")]
    pub(crate) client: Option<String>,
    /// Keep the daemon's stdout and stderr attached to this console.
    #[arg(short = 'd', long = "debug")]
    pub(crate) debug: bool,
    /// Location of the PID marker.
    #[arg(long, env = "LEAKWATCH_PID_FILE", default_value = DEFAULT_PID_PATH)]
    pub(crate) pid_file: PathBuf,
    /// Rotating log file.
    #[arg(long, env = "LEAKWATCH_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub(crate) log_file: PathBuf,
    /// Log filter expression, for example `info` or `leakwatchd::sensor=debug`.
    #[arg(long, env = "LEAKWATCH_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub(crate) log_filter: String,
    /// BCM number of the sensor pin.
    #[arg(long, env = "LEAKWATCH_PIN", default_value_t = DEFAULT_GPIO_PIN)]
    pub(crate) pin: u8,
}

impl Cli {
    pub(crate) fn sensor_config(&self) -> Result<SensorConfig, AppError> {
        SensorConfig::new(self.hub.as_deref(), self.client.as_deref()).map_err(AppError::from)
    }

    pub(crate) fn watch_settings(&self, config: SensorConfig) -> WatchSettings {
        WatchSettings::new(config).with_pin(self.pin)
    }

    pub(crate) fn log_settings(&self) -> LogSettings {
        LogSettings::new(&self.log_file, &self.log_filter)
    }

    pub(crate) fn supervisor_settings(&self) -> SupervisorSettings {
        let stdio = if self.debug {
            StdioTarget::Inherit
        } else {
            StdioTarget::Null
        };
        SupervisorSettings::new(&self.pid_file).with_stdio(stdio)
    }
}
