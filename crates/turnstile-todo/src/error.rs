//! Error types for todo operations.

use std::error::Error;

use thiserror::Error;
use uuid::Uuid;

/// Result alias for todo operations.
pub type TodoResult<T> = Result<T, TodoError>;

/// Errors raised by todo services and stores.
#[derive(Debug, Error)]
pub enum TodoError {
    /// Request input was invalid.
    #[error("invalid todo input")]
    Validation {
        /// Wire name of the offending field.
        field: &'static str,
        /// Machine-readable reason.
        reason: &'static str,
    },
    /// The item does not exist or belongs to another owner.
    #[error("todo not found")]
    NotFound {
        /// Requested item id.
        id: Uuid,
    },
    /// The backing store failed.
    #[error("todo store operation failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying store error.
        source: Box<dyn Error + Send + Sync>,
    },
}

impl TodoError {
    /// Whether the error is an infrastructure fault.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}
