//! Start-time configuration for the sensor watch loop.

use std::fmt;

use thiserror::Error;
use url::Url;

/// Destination and identity used when raising an alert.
///
/// Values are validated on construction so the daemon can fail before it
/// detaches from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    hub: Url,
    client_id: String,
}

impl SensorConfig {
    /// Validates the hub URL and client identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingConfiguration`] when either value is
    /// absent or blank, and [`ConfigError::InvalidHub`] when the hub is not
    /// an absolute URL.
    pub fn new(hub: Option<&str>, client_id: Option<&str>) -> Result<Self, ConfigError> {
        let hub = required(hub, RequiredField::Hub)?;
        let client_id = required(client_id, RequiredField::ClientId)?;
        let hub = Url::parse(hub).map_err(|source| ConfigError::InvalidHub {
            value: hub.to_owned(),
            source,
        })?;
        Ok(Self {
            hub,
            client_id: client_id.to_owned(),
        })
    }

    /// URL of the notification hub.
    #[must_use]
    pub const fn hub(&self) -> &Url {
        &self.hub
    }

    /// Identifier reported to the hub.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

fn required(value: Option<&str>, field: RequiredField) -> Result<&str, ConfigError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingConfiguration { field }),
    }
}

/// Settings that must be supplied before the daemon starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    /// The notification hub URL.
    Hub,
    /// The client identifier.
    ClientId,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hub => formatter.write_str("hub"),
            Self::ClientId => formatter.write_str("client_id"),
        }
    }
}

/// Errors raised while validating start-time configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value was absent or blank.
    #[error("Missing `{field}` configuration.")]
    MissingConfiguration {
        /// The missing setting.
        field: RequiredField,
    },
    /// The hub could not be parsed as an absolute URL.
    #[error("invalid hub URL '{value}': {source}")]
    InvalidHub {
        /// Value supplied by the operator.
        value: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },
}
