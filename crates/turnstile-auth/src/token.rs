//! Compact HS256 token signing and verification.
//!
//! # Design
//! - Tokens are JWS compact serialisations: `header.claims.signature`, each
//!   segment base64url without padding.
//! - Only `HS256` headers are accepted; anything else is rejected before the MAC
//!   is checked.
//! - Expiry is not evaluated here; the session manager compares `exp` against its
//!   injected clock.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::model::Role;

type HmacSha256 = Hmac<Sha256>;

const HS256: &str = "HS256";

/// Purpose of a token; access tokens cannot be replayed as refresh tokens and vice versa.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer credential.
    Access,
    /// Long-lived rotation credential.
    Refresh,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject identity.
    pub sub: String,
    /// Role asserted by access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Token purpose.
    pub typ: TokenKind,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Unique token id; keeps tokens minted in the same second distinct.
    pub jti: String,
}

impl Claims {
    /// Build claims for `subject` valid from `issued_at` until `expires_at`.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        role: Option<Role>,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject.into(),
            role,
            typ: kind,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Whether the claims have expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Errors raised by token signing and verification.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token did not have three base64url segments with JSON payloads.
    #[error("malformed token")]
    Malformed,
    /// Header named an algorithm other than HS256.
    #[error("unsupported token algorithm")]
    UnsupportedAlgorithm {
        /// Algorithm named in the header.
        alg: String,
    },
    /// MAC did not match.
    #[error("token signature mismatch")]
    BadSignature,
    /// The signing key was rejected by the MAC implementation.
    #[error("invalid signing key")]
    InvalidKey,
    /// Claims could not be serialised.
    #[error("failed to serialize token claims")]
    Serialize {
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

/// Signed-token primitive consumed by the session manager.
pub trait TokenSigner: Send + Sync {
    /// Sign `claims` with `secret`.
    ///
    /// # Errors
    ///
    /// Returns an error if claims cannot be serialised or the key is unusable.
    fn sign(&self, claims: &Claims, secret: &[u8]) -> Result<String, TokenError>;

    /// Verify the signature of `token` with `secret` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, uses another algorithm, or
    /// carries an invalid signature.
    fn verify(&self, token: &str, secret: &[u8]) -> Result<Claims, TokenError>;
}

#[derive(Serialize, Deserialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'a str,
}

/// HMAC-SHA256 signer producing compact JWS tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hs256Signer;

impl Hs256Signer {
    fn mac(secret: &[u8], signing_input: &str) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::InvalidKey)?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}

impl TokenSigner for Hs256Signer {
    fn sign(&self, claims: &Claims, secret: &[u8]) -> Result<String, TokenError> {
        let header = serde_json::to_vec(&Header {
            alg: HS256,
            typ: "JWT",
        })
        .map_err(|source| TokenError::Serialize { source })?;
        let payload =
            serde_json::to_vec(claims).map_err(|source| TokenError::Serialize { source })?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = Self::mac(secret, &signing_input)?.finalize().into_bytes();
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    fn verify(&self, token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header_json = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| TokenError::Malformed)?;
        let header: Header<'_> =
            serde_json::from_slice(&header_json).map_err(|_| TokenError::Malformed)?;
        if header.alg != HS256 {
            return Err(TokenError::UnsupportedAlgorithm {
                alg: header.alg.to_string(),
            });
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;
        Self::mac(secret, &format!("{header_b64}.{claims_b64}"))?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice(&claims_json).map_err(|_| TokenError::Malformed)
    }
}
