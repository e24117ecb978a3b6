//! Salted one-way password verifiers backed by argon2id.

use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    rand_core::OsRng,
};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

/// Errors raised while hashing or verifying secrets.
#[derive(Debug, Error)]
pub enum HashError {
    /// Cost parameters were rejected by argon2.
    #[error("invalid hash parameters")]
    InvalidParams {
        /// Parameter error detail.
        detail: argon2::Error,
    },
    /// Failed to hash secret material.
    #[error("failed to hash secret material")]
    HashFailed {
        /// Hashing error detail.
        detail: PasswordHashError,
    },
    /// Stored verifier could not be parsed.
    #[error("invalid stored hash")]
    StoredHashInvalid {
        /// Hash parsing error detail.
        detail: PasswordHashError,
    },
    /// Verification failed for a reason other than a mismatch.
    #[error("failed to verify secret")]
    VerifyFailed {
        /// Verification error detail.
        detail: PasswordHashError,
    },
    /// The blocking hashing task was cancelled or panicked.
    #[error("hashing task failed")]
    TaskFailed,
}

/// One-way salted hash primitive used for password verifiers.
pub trait CredentialHasher: Send + Sync {
    /// Produce a verifier for `plaintext`.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// Check `plaintext` against a stored verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the verifier is unparsable or verification fails for
    /// a reason other than a mismatch.
    fn verify(&self, plaintext: &str, verifier: &str) -> Result<bool, HashError>;
}

/// Argon2id hasher with a fixed work factor.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Build a hasher with explicit memory (KiB) and iteration costs.
    ///
    /// # Errors
    ///
    /// Returns an error if argon2 rejects the parameters.
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|detail| HashError::InvalidParams { detail })?;
        Ok(Self { params })
    }

    fn argon(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|detail| HashError::HashFailed { detail })?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, verifier: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(verifier).map_err(|detail| HashError::StoredHashInvalid { detail })?;
        match self.argon().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(detail) => Err(HashError::VerifyFailed { detail }),
        }
    }
}
