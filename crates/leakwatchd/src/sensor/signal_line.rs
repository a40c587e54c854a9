//! Digital input lines that report activation edges.

use rppal::gpio::{self, Gpio, InputPin, Trigger};
use thiserror::Error;
use tracing::{debug, warn};

use super::SENSOR_TARGET;

/// Handler invoked once per activation edge.
pub type ActivationCallback = Box<dyn FnMut() + Send + 'static>;

/// Input line exposing edge-triggered activation callbacks.
pub trait SignalLine: Send {
    /// Registers the activation handler and starts delivering edges.
    ///
    /// # Errors
    ///
    /// Returns [`SignalLineError`] when the line cannot be prepared.
    fn arm(&mut self, on_activate: ActivationCallback) -> Result<(), SignalLineError>;

    /// Stops delivering edges and releases the underlying resource.
    fn release(&mut self);
}

/// Errors raised while preparing a signal line.
#[derive(Debug, Error)]
pub enum SignalLineError {
    /// The GPIO peripheral or the pin could not be claimed.
    #[error("failed to claim GPIO pin {pin}: {source}")]
    Claim {
        /// BCM pin number.
        pin: u8,
        /// Underlying GPIO error.
        #[source]
        source: gpio::Error,
    },
    /// Edge interrupts could not be enabled.
    #[error("failed to enable edge interrupts on GPIO pin {pin}: {source}")]
    Interrupt {
        /// BCM pin number.
        pin: u8,
        /// Underlying GPIO error.
        #[source]
        source: gpio::Error,
    },
    /// The line was armed twice.
    #[error("signal line is already armed")]
    AlreadyArmed,
}

/// Edge on which a pulled-up sensor line becomes active.
///
/// The sensor shorts the line to ground when wet, so activation is the
/// high-to-low transition.
const ACTIVATION_EDGE: Trigger = Trigger::FallingEdge;

/// GPIO input on the Raspberry Pi header, addressed by BCM number.
///
/// Arming claims the pin through the GPIO character device, enables the
/// internal pull-up and registers a falling-edge interrupt; callbacks run on
/// the interrupt thread owned by the pin. Nothing touches the hardware until
/// [`SignalLine::arm`] is called.
#[derive(Debug)]
pub struct GpioSignalLine {
    pin: u8,
    input: Option<InputPin>,
}

impl GpioSignalLine {
    /// Targets BCM `pin`.
    #[must_use]
    pub const fn new(pin: u8) -> Self {
        Self { pin, input: None }
    }

    /// BCM pin number.
    #[must_use]
    pub const fn pin(&self) -> u8 {
        self.pin
    }

    /// Whether edges are currently being delivered.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.input.is_some()
    }
}

impl SignalLine for GpioSignalLine {
    fn arm(&mut self, mut on_activate: ActivationCallback) -> Result<(), SignalLineError> {
        if self.is_armed() {
            return Err(SignalLineError::AlreadyArmed);
        }
        let pin = self.pin;
        let claim = |source| SignalLineError::Claim { pin, source };
        let mut input = Gpio::new()
            .and_then(|chip| chip.get(pin))
            .map_err(claim)?
            .into_input_pullup();
        input
            .set_async_interrupt(ACTIVATION_EDGE, None, move |event| {
                debug!(target: SENSOR_TARGET, pin, trigger = ?event.trigger, "edge observed");
                on_activate();
            })
            .map_err(|source| SignalLineError::Interrupt { pin, source })?;
        self.input = Some(input);
        debug!(target: SENSOR_TARGET, pin, "signal line armed with pull-up");
        Ok(())
    }

    fn release(&mut self) {
        let Some(mut input) = self.input.take() else {
            return;
        };
        if let Err(error) = input.clear_async_interrupt() {
            warn!(target: SENSOR_TARGET, pin = self.pin, %error, "failed to clear edge interrupt");
        }
        // Dropping the pin restores its previous mode and bias.
        drop(input);
        debug!(target: SENSOR_TARGET, pin = self.pin, "signal line released");
    }
}

impl Drop for GpioSignalLine {
    fn drop(&mut self) {
        self.release();
    }
}
