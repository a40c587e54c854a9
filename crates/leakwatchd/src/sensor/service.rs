//! Wires signal-line activations to alert delivery.

use std::time::{Duration, Instant};

use leakwatch_config::SensorConfig;
use thiserror::Error;
use tracing::{info, warn};

use super::SENSOR_TARGET;
use super::alert::AlertSink;
use super::signal_line::{SignalLine, SignalLineError};
use super::throttle::AlertThrottle;
use crate::process::{ShutdownError, ShutdownSignal};

/// Errors that end the watch loop.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The signal line could not be armed.
    #[error(transparent)]
    Line(#[from] SignalLineError),
    /// Waiting for shutdown failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

/// What happened to a single activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The hub accepted the alert.
    Delivered,
    /// An alert was attempted but not accepted.
    DeliveryFailed,
    /// The activation fell inside the hysteresis window.
    Suppressed {
        /// Time left before the next alert is admitted.
        remaining: Duration,
    },
}

/// Handles activations: throttles, dispatches and logs.
#[derive(Debug)]
pub struct ActivationResponder<S> {
    config: SensorConfig,
    sink: S,
    throttle: AlertThrottle,
}

impl<S: AlertSink> ActivationResponder<S> {
    /// Builds a responder with the given throttle.
    #[must_use]
    pub const fn new(config: SensorConfig, sink: S, throttle: AlertThrottle) -> Self {
        Self {
            config,
            sink,
            throttle,
        }
    }

    /// Current throttle state.
    #[must_use]
    pub const fn throttle(&self) -> &AlertThrottle {
        &self.throttle
    }

    /// Responds to an activation observed at `now`.
    ///
    /// Delivery failures are logged and never retried.
    pub fn on_activation(&mut self, now: Instant) -> ActivationOutcome {
        info!(target: SENSOR_TARGET, "Detected water, alerting!");
        if !self.throttle.admit(now) {
            let remaining = self.throttle.remaining(now);
            info!(
                target: SENSOR_TARGET,
                remaining_secs = remaining.as_secs(),
                "alert suppressed inside hysteresis window"
            );
            return ActivationOutcome::Suppressed { remaining };
        }
        match self.sink.notify(self.config.hub(), self.config.client_id()) {
            Ok(()) => {
                info!(
                    target: SENSOR_TARGET,
                    hub = %self.config.hub(),
                    client = self.config.client_id(),
                    "alert delivered"
                );
                ActivationOutcome::Delivered
            }
            Err(error) => {
                warn!(
                    target: SENSOR_TARGET,
                    hub = %self.config.hub(),
                    %error,
                    "alert delivery failed"
                );
                ActivationOutcome::DeliveryFailed
            }
        }
    }
}

/// Releases the wrapped line on every exit path.
struct LineGuard<L: SignalLine> {
    line: L,
}

impl<L: SignalLine> Drop for LineGuard<L> {
    fn drop(&mut self) {
        info!(target: SENSOR_TARGET, "Stopping sensor.");
        self.line.release();
    }
}

/// The watch loop hosted by the daemon.
#[derive(Debug)]
pub struct WaterSensorService<S> {
    responder: ActivationResponder<S>,
}

impl<S: AlertSink + 'static> WaterSensorService<S> {
    /// Builds a service with the default hysteresis window.
    #[must_use]
    pub fn new(config: SensorConfig, sink: S) -> Self {
        Self::with_throttle(config, sink, AlertThrottle::default())
    }

    /// Builds a service with an explicit throttle.
    #[must_use]
    pub const fn with_throttle(config: SensorConfig, sink: S, throttle: AlertThrottle) -> Self {
        Self {
            responder: ActivationResponder::new(config, sink, throttle),
        }
    }

    /// Arms `line` and blocks until `shutdown` fires.
    ///
    /// The line is released before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when arming or waiting fails.
    pub fn arm<L, H>(self, line: L, shutdown: &mut H) -> Result<(), ServiceError>
    where
        L: SignalLine,
        H: ShutdownSignal + ?Sized,
    {
        info!(target: SENSOR_TARGET, "Starting sensor.");
        let mut responder = self.responder;
        let mut guard = LineGuard { line };
        guard.line.arm(Box::new(move || {
            responder.on_activation(Instant::now());
        }))?;
        shutdown.wait()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    use mockall::mock;
    use rstest::{fixture, rstest};
    use url::Url;

    use super::*;
    use crate::sensor::alert::DeliveryError;
    use crate::sensor::signal_line::ActivationCallback;

    mock! {
        Sink {}
        impl AlertSink for Sink {
            fn notify(&self, destination: &Url, client_id: &str) -> Result<(), DeliveryError>;
        }
    }

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[fixture]
    fn config() -> SensorConfig {
        SensorConfig::new(Some("https://hub.example/alert"), Some("basement"))
            .expect("valid configuration")
    }

    fn rejected() -> DeliveryError {
        DeliveryError::Rejected {
            destination: Url::parse("https://hub.example/alert").expect("url"),
            status: reqwest::StatusCode::BAD_GATEWAY,
        }
    }

    /// Line double whose callback is fired by the test.
    #[derive(Clone, Default)]
    struct ManualLine {
        callback: Arc<Mutex<Option<ActivationCallback>>>,
        released: Arc<AtomicBool>,
    }

    impl ManualLine {
        fn fire(&self) {
            let mut slot = self.callback.lock().unwrap_or_else(PoisonError::into_inner);
            let callback = slot.as_mut().expect("line armed");
            callback();
        }

        fn released(&self) -> bool {
            self.released.load(Ordering::SeqCst)
        }
    }

    impl SignalLine for ManualLine {
        fn arm(&mut self, on_activate: ActivationCallback) -> Result<(), SignalLineError> {
            *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(on_activate);
            Ok(())
        }

        fn release(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    /// Line double that refuses to arm.
    #[derive(Clone, Default)]
    struct BrokenLine {
        released: Arc<AtomicBool>,
    }

    impl SignalLine for BrokenLine {
        fn arm(&mut self, _on_activate: ActivationCallback) -> Result<(), SignalLineError> {
            Err(SignalLineError::AlreadyArmed)
        }

        fn release(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    /// Shutdown double that fires the line a fixed number of times, then
    /// returns as if a termination signal arrived.
    struct ScriptedShutdown {
        line: ManualLine,
        activations: usize,
        waits: Arc<AtomicUsize>,
    }

    impl ShutdownSignal for ScriptedShutdown {
        fn wait(&mut self) -> Result<(), ShutdownError> {
            self.waits.fetch_add(1, Ordering::SeqCst);
            assert!(!self.line.released(), "line must stay armed while watching");
            for _ in 0..self.activations {
                self.line.fire();
            }
            Ok(())
        }
    }

    #[rstest]
    fn first_activation_dispatches_with_client_id(config: SensorConfig) {
        let mut sink = MockSink::new();
        sink.expect_notify()
            .withf(|destination, client| {
                destination.as_str() == "https://hub.example/alert" && client == "basement"
            })
            .once()
            .returning(|_, _| Ok(()));
        let mut responder = ActivationResponder::new(config, sink, AlertThrottle::default());

        assert_eq!(
            responder.on_activation(Instant::now()),
            ActivationOutcome::Delivered
        );
    }

    #[rstest]
    fn activations_inside_window_are_suppressed(config: SensorConfig) {
        let mut sink = MockSink::new();
        sink.expect_notify().times(2).returning(|_, _| Ok(()));
        let mut responder = ActivationResponder::new(config, sink, AlertThrottle::new(6 * HOUR));
        let origin = Instant::now();

        let outcomes: Vec<_> = [0, 2, 7, 8]
            .into_iter()
            .map(|hours| responder.on_activation(origin + HOUR * hours))
            .collect();

        assert_eq!(
            outcomes,
            vec![
                ActivationOutcome::Delivered,
                ActivationOutcome::Suppressed {
                    remaining: 4 * HOUR
                },
                ActivationOutcome::Delivered,
                ActivationOutcome::Suppressed {
                    remaining: 5 * HOUR
                },
            ]
        );
    }

    #[rstest]
    fn delivery_failure_is_swallowed_and_still_starts_window(config: SensorConfig) {
        let mut sink = MockSink::new();
        sink.expect_notify().once().returning(|_, _| Err(rejected()));
        let mut responder = ActivationResponder::new(config, sink, AlertThrottle::default());
        let origin = Instant::now();

        assert_eq!(
            responder.on_activation(origin),
            ActivationOutcome::DeliveryFailed
        );
        assert_eq!(responder.throttle().last_dispatch(), Some(origin));
        assert!(matches!(
            responder.on_activation(origin + HOUR),
            ActivationOutcome::Suppressed { .. }
        ));
    }

    #[rstest]
    fn service_watches_until_shutdown_then_releases_line(config: SensorConfig) {
        let mut sink = MockSink::new();
        sink.expect_notify().once().returning(|_, _| Ok(()));
        let line = ManualLine::default();
        let waits = Arc::new(AtomicUsize::new(0));
        let mut shutdown = ScriptedShutdown {
            line: line.clone(),
            activations: 3,
            waits: Arc::clone(&waits),
        };

        WaterSensorService::new(config, sink)
            .arm(line.clone(), &mut shutdown)
            .expect("service exits cleanly");

        assert_eq!(waits.load(Ordering::SeqCst), 1);
        assert!(line.released(), "line released on shutdown");
    }

    #[rstest]
    fn arm_failure_still_releases_line(config: SensorConfig) {
        let sink = MockSink::new();
        let line = BrokenLine::default();
        let waits = Arc::new(AtomicUsize::new(0));
        let mut shutdown = ScriptedShutdown {
            line: ManualLine::default(),
            activations: 0,
            waits: Arc::clone(&waits),
        };

        let error = WaterSensorService::new(config, sink)
            .arm(line.clone(), &mut shutdown)
            .expect_err("arming fails");

        assert!(matches!(error, ServiceError::Line(_)));
        assert_eq!(waits.load(Ordering::SeqCst), 0, "never waits for shutdown");
        assert!(line.released.load(Ordering::SeqCst));
    }
}
