//! User directory contract consumed by the session manager.
//!
//! # Design
//! - Every method is atomic with respect to a single record.
//! - `swap_refresh_token` is a compare-and-swap so two concurrent refreshes
//!   presenting the same token cannot both win.

use std::error::Error;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{CredentialRecord, NewCredential};

/// Result alias for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors raised by user directory backends.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate credential field")]
    Duplicate {
        /// Wire name of the duplicated field (`username` or `email`).
        field: &'static str,
    },
    /// The backing store failed.
    #[error("directory backend failure")]
    Backend {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying backend error.
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Persistent store of credential records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a record by identity.
    async fn find_by_identity(&self, identity: &str) -> DirectoryResult<Option<CredentialRecord>>;

    /// Look up a record by secondary identifier.
    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<CredentialRecord>>;

    /// Persist a new record; fails with [`DirectoryError::Duplicate`] on collisions.
    async fn insert(&self, record: NewCredential) -> DirectoryResult<CredentialRecord>;

    /// Overwrite (or clear) the stored refresh reference. Returns `false` when the
    /// identity does not exist.
    async fn set_refresh_token(&self, identity: &str, token: Option<&str>)
    -> DirectoryResult<bool>;

    /// Replace the stored refresh reference with `next` only if it currently equals
    /// `expected`. Returns whether the swap happened.
    async fn swap_refresh_token(
        &self,
        identity: &str,
        expected: &str,
        next: &str,
    ) -> DirectoryResult<bool>;

    /// Replace the password verifier and clear the refresh reference in one write.
    /// Returns `false` when the identity does not exist.
    async fn replace_password_hash(
        &self,
        identity: &str,
        password_hash: &str,
    ) -> DirectoryResult<bool>;
}
