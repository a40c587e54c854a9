use std::time::Duration;

use leakwatch_config::DEFAULT_ALERT_TIMEOUT;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::SENSOR_TARGET;

/// Delivers a leak notification for a client to a destination.
pub trait AlertSink: Send {
    /// Sends one notification. Callers do not retry on failure.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the notification was not accepted.
    fn notify(&self, destination: &Url, client_id: &str) -> Result<(), DeliveryError>;
}

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or timed out.
    #[error("failed to reach '{destination}': {source}")]
    Transport {
        /// Hub that was contacted.
        destination: Url,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The hub answered with a non-success status.
    #[error("'{destination}' rejected the alert with status {status}")]
    Rejected {
        /// Hub that was contacted.
        destination: Url,
        /// Status returned by the hub.
        status: StatusCode,
    },
}

/// Sink that posts `client=<id>` as a form body to the hub.
#[derive(Debug, Clone)]
pub struct HttpAlertSink {
    client: Client,
}

impl HttpAlertSink {
    /// Builds a sink with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Client`] when the client cannot be built.
    pub fn new() -> Result<Self, DeliveryError> {
        Self::with_timeout(DEFAULT_ALERT_TIMEOUT)
    }

    /// Builds a sink whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Client`] when the client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|source| DeliveryError::Client { source })?;
        Ok(Self { client })
    }
}

impl AlertSink for HttpAlertSink {
    fn notify(&self, destination: &Url, client_id: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(destination.clone())
            .form(&[("client", client_id)])
            .send()
            .map_err(|source| DeliveryError::Transport {
                destination: destination.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                destination: destination.clone(),
                status,
            });
        }
        debug!(
            target: SENSOR_TARGET,
            destination = %destination,
            status = status.as_u16(),
            "hub accepted alert"
        );
        Ok(())
    }
}
