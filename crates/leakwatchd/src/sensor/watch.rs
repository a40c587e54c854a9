use std::time::Duration;

use leakwatch_config::{DEFAULT_GPIO_PIN, DEFAULT_HYSTERESIS, SensorConfig};
use thiserror::Error;
use tracing::debug;

use super::SENSOR_TARGET;
use super::alert::{DeliveryError, HttpAlertSink};
use super::service::{ServiceError, WaterSensorService};
use super::signal_line::GpioSignalLine;
use super::throttle::AlertThrottle;
use crate::process::{ShutdownError, SystemShutdownSignal};

/// Everything the production watch loop needs once detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    config: SensorConfig,
    pin: u8,
    hysteresis: Duration,
}

impl WatchSettings {
    /// Builds settings for the default pin and hysteresis window.
    #[must_use]
    pub fn new(config: SensorConfig) -> Self {
        Self {
            config,
            pin: DEFAULT_GPIO_PIN,
            hysteresis: DEFAULT_HYSTERESIS,
        }
    }

    /// Selects the BCM pin wired to the sensor.
    #[must_use]
    pub const fn with_pin(mut self, pin: u8) -> Self {
        self.pin = pin;
        self
    }

    /// Overrides the hysteresis window.
    #[must_use]
    pub const fn with_hysteresis(mut self, hysteresis: Duration) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    /// Hub destination and client identity.
    #[must_use]
    pub const fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// BCM pin number.
    #[must_use]
    pub const fn pin(&self) -> u8 {
        self.pin
    }

    /// Minimum interval between alerts.
    #[must_use]
    pub const fn hysteresis(&self) -> Duration {
        self.hysteresis
    }
}

/// Errors that end the production watch loop.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The termination signal listener could not be installed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
    /// The alert sink could not be built.
    #[error(transparent)]
    Sink(#[from] DeliveryError),
    /// The service failed while watching.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Runs the sensor watch loop until a termination signal arrives.
///
/// Signal handlers are installed before any resource is acquired so that an
/// early `SIGINT` still leads to an orderly release.
///
/// # Errors
///
/// Returns [`WatchError`] when setup fails or the line cannot be armed.
pub fn watch(settings: &WatchSettings) -> Result<(), WatchError> {
    let mut shutdown = SystemShutdownSignal::install()?;
    let sink = HttpAlertSink::new()?;
    let line = GpioSignalLine::new(settings.pin());
    debug!(
        target: SENSOR_TARGET,
        pin = line.pin(),
        hub = %settings.config().hub(),
        hysteresis_secs = settings.hysteresis().as_secs(),
        "watch loop configured"
    );
    WaterSensorService::with_throttle(
        settings.config().clone(),
        sink,
        AlertThrottle::new(settings.hysteresis()),
    )
    .arm(line, &mut shutdown)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SensorConfig {
        SensorConfig::new(Some("https://hub.example/alert"), Some("basement"))
            .expect("valid configuration")
    }

    #[test]
    fn defaults_target_bcm_four_with_six_hour_window() {
        let settings = WatchSettings::new(config());
        assert_eq!(settings.pin(), 4);
        assert_eq!(settings.hysteresis(), Duration::from_secs(6 * 60 * 60));
    }

    #[test]
    fn overrides_apply() {
        let settings = WatchSettings::new(config())
            .with_pin(17)
            .with_hysteresis(Duration::from_secs(60));
        assert_eq!(settings.pin(), 17);
        assert_eq!(settings.hysteresis(), Duration::from_secs(60));
        assert_eq!(settings.config().client_id(), "basement");
    }
}
