//! Error types for session and credential operations.
//!
//! # Design
//! - Four caller-facing kinds (validation, conflict, authentication,
//!   authorization) plus opaque infrastructure failures.
//! - Authentication failures render one message per operation regardless of
//!   which check failed.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::hasher::HashError;
use crate::model::Role;
use crate::token::TokenError;

/// Result alias for session manager operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Operation-level reason attached to an authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Login with an unknown secondary identifier or a wrong password.
    InvalidCredentials,
    /// Access token absent, malformed, forged, or expired.
    InvalidAccessToken,
    /// Refresh token malformed, forged, expired, rotated, or revoked.
    InvalidRefreshToken,
}

impl AuthFailure {
    /// Stable message surfaced to callers.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid credentials",
            Self::InvalidAccessToken => "invalid or expired token",
            Self::InvalidRefreshToken => "invalid refresh token",
        }
    }
}

impl Display for AuthFailure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.message())
    }
}

/// Primary error type for the session manager.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Required input was missing or malformed.
    #[error("invalid input")]
    Validation {
        /// Wire name of the offending field.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A unique credential field is already taken.
    #[error("credential already exists")]
    Conflict {
        /// Wire name of the duplicated field.
        field: &'static str,
    },
    /// Credentials or tokens were rejected.
    #[error("{failure}")]
    Authentication {
        /// Which operation rejected the caller.
        failure: AuthFailure,
    },
    /// Caller is authenticated but lacks the required role.
    #[error("insufficient role")]
    Authorization {
        /// Role the operation demands.
        required: Role,
        /// Role carried by the caller.
        actual: Role,
    },
    /// No credential record exists for an authenticated identity.
    #[error("credential record not found")]
    NotFound {
        /// Identity that was looked up.
        identity: String,
    },
    /// The user directory failed.
    #[error("credential directory operation failed")]
    Directory {
        /// Operation identifier.
        operation: &'static str,
        /// Source directory error.
        source: DirectoryError,
    },
    /// Password hashing or verification failed.
    #[error("password hashing failed")]
    Hash {
        /// Source hashing error.
        source: HashError,
    },
    /// Token signing failed.
    #[error("token signing failed")]
    Signing {
        /// Source signer error.
        source: TokenError,
    },
}

impl AuthError {
    pub(crate) const fn authentication(failure: AuthFailure) -> Self {
        Self::Authentication { failure }
    }

    pub(crate) const fn directory(operation: &'static str, source: DirectoryError) -> Self {
        Self::Directory { operation, source }
    }

    /// Whether the error is an infrastructure fault rather than a caller mistake.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Directory { .. } | Self::Hash { .. } | Self::Signing { .. }
        )
    }
}
