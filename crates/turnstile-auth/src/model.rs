//! Credential records, roles, and session artefacts.
//!
//! # Design
//! - Pure data carriers shared by the manager, directories, and HTTP layer.
//! - Types holding plaintext passwords redact them from `Debug` output.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access level carried on credential records and access tokens.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account.
    #[default]
    User,
    /// Elevated account allowed onto admin-only operations.
    Admin,
}

impl Role {
    /// Render the role as its lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Whether a caller holding `self` may perform an operation requiring `required`.
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        matches!((self, required), (Self::Admin, _) | (Self::User, Self::User))
    }
}

/// Raised when a stored or transmitted role label is not recognised.
#[derive(Debug, Error)]
#[error("invalid role")]
pub struct InvalidRole {
    /// Label provided by the caller.
    pub value: String,
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(InvalidRole {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Stored credential record for one identity.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Unique, case-sensitive identity (username).
    pub identity: String,
    /// Unique secondary identifier used to log in.
    pub email: String,
    /// Salted one-way password verifier (PHC string).
    pub password_hash: String,
    /// Granted role.
    pub role: Role,
    /// The single refresh token currently accepted for this identity.
    pub refresh_token: Option<String>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Public view of the record without verifier or session state.
    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile {
            identity: self.identity.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }

    /// Whether an active session (refresh reference) is stored.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.refresh_token.is_some()
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CredentialRecord")
            .field("identity", &self.identity)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("has_session", &self.has_session())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Record payload handed to a directory on registration.
#[derive(Clone)]
pub struct NewCredential {
    /// Unique identity.
    pub identity: String,
    /// Unique secondary identifier.
    pub email: String,
    /// Password verifier; never plaintext.
    pub password_hash: String,
    /// Granted role.
    pub role: Role,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewCredential {
    /// Materialise the stored record, starting without a session.
    #[must_use]
    pub fn into_record(self) -> CredentialRecord {
        CredentialRecord {
            identity: self.identity,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            refresh_token: None,
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for NewCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("NewCredential")
            .field("identity", &self.identity)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Registration request accepted by [`crate::SessionManager::register`].
#[derive(Clone, Default)]
pub struct Registration {
    /// Requested identity.
    pub identity: String,
    /// Secondary identifier (email).
    pub email: String,
    /// Plaintext password; hashed and dropped during registration.
    pub password: String,
    /// Optional privilege claim evaluated by the elevation policy.
    pub elevation_claim: Option<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Registration")
            .field("identity", &self.identity)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("elevation_claim", &self.elevation_claim.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Password change request for an authenticated identity.
#[derive(Clone)]
pub struct PasswordChange {
    /// Password currently on record.
    pub current: String,
    /// Replacement password.
    pub replacement: String,
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PasswordChange { .. }")
    }
}

/// Public projection of a credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity.
    pub identity: String,
    /// Secondary identifier.
    pub email: String,
    /// Granted role.
    pub role: Role,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Verified caller extracted from an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Token subject.
    pub identity: String,
    /// Role asserted by the token.
    pub role: Role,
}

/// Access and refresh tokens minted together.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived stateless token.
    pub access_token: String,
    /// Long-lived stateful token, single use.
    pub refresh_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokenPair")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_and_formats() {
        assert_eq!("user".parse::<Role>().ok(), Some(Role::User));
        assert_eq!("admin".parse::<Role>().ok(), Some(Role::Admin));
        assert!("Admin".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn admin_satisfies_every_role() {
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::User));
        assert!(Role::User.satisfies(Role::User));
        assert!(!Role::User.satisfies(Role::Admin));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let registration = Registration {
            identity: "alice".into(),
            email: "a@x.com".into(),
            password: "pw1".into(),
            elevation_claim: Some("letmein".into()),
        };
        let rendered = format!("{registration:?}");
        assert!(!rendered.contains("pw1"));
        assert!(!rendered.contains("letmein"));

        let record = NewCredential {
            identity: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::User,
            created_at: Utc::now(),
        }
        .into_record();
        assert!(!record.has_session());
        assert!(!format!("{record:?}").contains("argon2id"));
    }
}
