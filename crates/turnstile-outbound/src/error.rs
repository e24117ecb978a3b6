//! Error types for outbound operations.

use std::error::Error;

use thiserror::Error;

/// Result alias for outbound operations.
pub type OutboundResult<T> = Result<T, OutboundError>;

/// Errors raised by mailers, upload sinks, and the service over them.
#[derive(Debug, Error)]
pub enum OutboundError {
    /// Request input was invalid.
    #[error("invalid outbound input")]
    Validation {
        /// Wire name of the offending field.
        field: &'static str,
        /// Machine-readable reason.
        reason: &'static str,
    },
    /// The transport failed.
    #[error("outbound delivery failed")]
    Delivery {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying transport error.
        source: Box<dyn Error + Send + Sync>,
    },
}

impl OutboundError {
    /// Whether the error is an infrastructure fault.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Delivery { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn only_delivery_failures_are_internal() {
        let invalid = OutboundError::Validation {
            field: "to",
            reason: "must not be empty",
        };
        assert!(!invalid.is_internal());
        assert_eq!(invalid.to_string(), "invalid outbound input");

        let failed = OutboundError::Delivery {
            operation: "mail.send",
            source: Box::new(io::Error::other("connection refused")),
        };
        assert!(failed.is_internal());
        assert!(failed.source().is_some());
    }
}
