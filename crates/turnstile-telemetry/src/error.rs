//! Telemetry failures: subscriber installation, collector setup, rendering.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::string::FromUtf8Error;

use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by logging and metrics setup.
#[derive(Debug)]
pub enum TelemetryError {
    /// A global subscriber was already installed or could not be set.
    Subscriber {
        /// Underlying installation error.
        source: TryInitError,
    },
    /// A counter could not be created or added to the registry.
    Collector {
        /// Counter name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// The text encoder rejected the gathered families.
    Encode {
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// The encoded exposition was not UTF-8.
    NonUtf8 {
        /// Underlying conversion error.
        source: FromUtf8Error,
    },
    /// A log format label was not recognised.
    UnknownLogFormat {
        /// Label supplied by configuration.
        value: String,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Subscriber { .. } => "tracing subscriber could not be installed",
            Self::Collector { .. } => "metrics collector setup failed",
            Self::Encode { .. } => "metrics encoding failed",
            Self::NonUtf8 { .. } => "metrics exposition was not utf-8",
            Self::UnknownLogFormat { .. } => "unknown log format",
        };
        formatter.write_str(message)
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Subscriber { source } => Some(source),
            Self::Collector { source, .. } | Self::Encode { source } => Some(source),
            Self::NonUtf8 { source } => Some(source),
            Self::UnknownLogFormat { .. } => None,
        }
    }
}
