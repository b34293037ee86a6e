//! Error types for the sensor, notification and configuration layers.
//!
//! The debounce state machine itself never fails; everything that can go
//! wrong lives at its edges and is described here.

use thiserror::Error;

/// Errors raised while reading the level sensor.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// The GPIO interface could not be opened or read (pin not exported,
    /// permission denied, no sysfs GPIO support on this machine).
    #[error("GPIO pin {pin} unavailable: {source}")]
    Unavailable {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    /// The pin's value file contained something other than `0` or `1`.
    #[error("GPIO pin {pin} returned unexpected value {value:?}")]
    InvalidValue { pin: u32, value: String },

    /// The sensor has not produced a reading yet.
    #[error("No sensor reading available")]
    NoReading,

    /// The producer feeding the sensor went away.
    #[error("Sensor source disconnected")]
    Disconnected,
}

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notification backend rejected the credentials.
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// The backend could not be reached or the transfer failed.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Sender, credentials or recipients are missing or malformed.
    #[error("Notification configuration incomplete: {0}")]
    ConfigIncomplete(String),

    /// The send did not finish within the configured timeout.
    #[error("Notification timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl NotifyError {
    /// Short label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyError::AuthFailure(_) => "auth",
            NotifyError::NetworkFailure(_) => "network",
            NotifyError::ConfigIncomplete(_) => "config",
            NotifyError::Timeout(_) => "timeout",
        }
    }
}

impl From<lettre::transport::smtp::Error> for NotifyError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        // 530/534/535: authentication required, mechanism too weak, credentials rejected
        let auth_rejected = err
            .status()
            .map(|code| code.to_string().starts_with("53"))
            .unwrap_or(false);

        if err.is_permanent() && auth_rejected {
            NotifyError::AuthFailure(err.to_string())
        } else {
            NotifyError::NetworkFailure(err.to_string())
        }
    }
}

impl From<lettre::address::AddressError> for NotifyError {
    fn from(err: lettre::address::AddressError) -> Self {
        NotifyError::ConfigIncomplete(format!("invalid email address: {}", err))
    }
}

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or environment could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values were read but are not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
