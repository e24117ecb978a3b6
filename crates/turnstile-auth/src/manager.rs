//! Session & credential manager.
//!
//! # Design
//! - Per identity the stored refresh reference moves through
//!   `NoSession → Active(t)` (login), `Active(t) → Active(t')` (refresh
//!   presenting `t`), and `Active(t) → NoSession` (logout or password change).
//! - Access tokens are verified without touching the directory; refresh tokens
//!   must equal the stored reference and are rotated with a compare-and-swap.
//! - Password hashing runs on the blocking pool; plaintext is moved into the
//!   hashing task and dropped there.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::directory::{DirectoryError, UserDirectory};
use crate::error::{AuthError, AuthFailure, AuthResult};
use crate::hasher::{CredentialHasher, HashError};
use crate::model::{
    CredentialRecord, NewCredential, PasswordChange, Principal, Profile, Registration, Role,
    TokenPair,
};
use crate::token::{Claims, Hs256Signer, TokenKind, TokenSigner};

/// Orchestrates registration, login, token verification, rotation, and logout.
pub struct SessionManager {
    config: SessionConfig,
    directory: Arc<dyn UserDirectory>,
    hasher: Arc<dyn CredentialHasher>,
    signer: Arc<dyn TokenSigner>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Construct a manager using the system clock and the HS256 signer.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        directory: Arc<dyn UserDirectory>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            config,
            directory,
            hasher,
            signer: Arc::new(Hs256Signer),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the token signer.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn TokenSigner>) -> Self {
        self.signer = signer;
        self
    }

    /// Register a new credential record.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for empty fields, [`AuthError::Conflict`]
    /// when the email or identity is taken, and infrastructure errors otherwise.
    #[instrument(name = "session.register", skip_all, fields(identity = %registration.identity))]
    pub async fn register(&self, registration: Registration) -> AuthResult<CredentialRecord> {
        let Registration {
            identity,
            email,
            password,
            elevation_claim,
        } = registration;
        require_present("username", &identity)?;
        require_present("email", &email)?;
        require_password("password", &password)?;

        let existing = self
            .directory
            .find_by_email(&email)
            .await
            .map_err(|source| AuthError::directory("find_by_email", source))?;
        if existing.is_some() {
            warn!("registration rejected: email already registered");
            return Err(AuthError::Conflict { field: "email" });
        }

        let role = self
            .config
            .elevation
            .resolve_role(&identity, elevation_claim.as_deref());
        let password_hash = self.hash_password(password).await?;

        let record = self
            .directory
            .insert(NewCredential {
                identity,
                email,
                password_hash,
                role,
                created_at: self.clock.now(),
            })
            .await
            .map_err(|err| match err {
                DirectoryError::Duplicate { field } => AuthError::Conflict { field },
                source @ DirectoryError::Backend { .. } => AuthError::directory("insert", source),
            })?;

        info!(role = %record.role, "credential registered");
        Ok(record)
    }

    /// Log in with the secondary identifier and password, starting a new session.
    ///
    /// Any previously issued refresh token for the identity stops working.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] with
    /// [`AuthFailure::InvalidCredentials`] for unknown emails and wrong passwords
    /// alike.
    #[instrument(name = "session.authenticate", skip_all)]
    pub async fn authenticate(&self, email: &str, password: &str) -> AuthResult<TokenPair> {
        require_present("email", email)?;
        require_password("password", password)?;

        let record = self
            .directory
            .find_by_email(email)
            .await
            .map_err(|source| AuthError::directory("find_by_email", source))?;
        let Some(record) = record else {
            debug!("login rejected: unknown email");
            return Err(AuthError::authentication(AuthFailure::InvalidCredentials));
        };

        if !self
            .verify_password(password.to_string(), record.password_hash.clone())
            .await?
        {
            debug!(identity = %record.identity, "login rejected: password mismatch");
            return Err(AuthError::authentication(AuthFailure::InvalidCredentials));
        }

        let pair = self.issue_pair(&record.identity, record.role)?;
        self.directory
            .set_refresh_token(&record.identity, Some(&pair.refresh_token))
            .await
            .map_err(|source| AuthError::directory("set_refresh_token", source))?;

        info!(identity = %record.identity, "session established");
        Ok(pair)
    }

    /// Verify an access token and return the caller it asserts.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] when the token is empty, malformed,
    /// signed with another secret, not an access token, or expired.
    pub fn verify_access(&self, token: &str) -> AuthResult<Principal> {
        let invalid = || AuthError::authentication(AuthFailure::InvalidAccessToken);
        if token.trim().is_empty() {
            return Err(invalid());
        }

        let claims = self
            .signer
            .verify(token, &self.config.access_secret)
            .map_err(|err| {
                debug!(error = %err, "access token rejected");
                invalid()
            })?;
        if claims.typ != TokenKind::Access || claims.is_expired_at(self.clock.now()) {
            return Err(invalid());
        }
        let role = claims.role.ok_or_else(invalid)?;

        Ok(Principal {
            identity: claims.sub,
            role,
        })
    }

    /// Require `principal` to hold at least `required`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authorization`] when the role is insufficient.
    pub fn authorize(principal: &Principal, required: Role) -> AuthResult<()> {
        if principal.role.satisfies(required) {
            Ok(())
        } else {
            warn!(identity = %principal.identity, required = %required, "role check failed");
            Err(AuthError::Authorization {
                required,
                actual: principal.role,
            })
        }
    }

    /// Verify an access token and require `required` in one step.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] for bad tokens and
    /// [`AuthError::Authorization`] for insufficient roles.
    pub fn verify_role(&self, token: &str, required: Role) -> AuthResult<Principal> {
        let principal = self.verify_access(token)?;
        Self::authorize(&principal, required)?;
        Ok(principal)
    }

    /// Exchange the current refresh token for a new pair, rotating the stored reference.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Authentication`] with
    /// [`AuthFailure::InvalidRefreshToken`] when the token is malformed, forged,
    /// expired, or no longer the stored reference.
    #[instrument(name = "session.refresh", skip_all)]
    pub async fn refresh(&self, presented: &str) -> AuthResult<TokenPair> {
        let invalid = || AuthError::authentication(AuthFailure::InvalidRefreshToken);

        let claims = self.decode_refresh(presented).ok_or_else(invalid)?;
        if claims.is_expired_at(self.clock.now()) {
            debug!(identity = %claims.sub, "refresh rejected: token expired");
            return Err(invalid());
        }

        let record = self
            .directory
            .find_by_identity(&claims.sub)
            .await
            .map_err(|source| AuthError::directory("find_by_identity", source))?;
        let Some(record) = record else {
            warn!(identity = %claims.sub, "refresh rejected: identity missing");
            return Err(invalid());
        };
        if !tokens_match(record.refresh_token.as_deref(), presented) {
            warn!(identity = %record.identity, "refresh rejected: token is not the active session");
            return Err(invalid());
        }

        let pair = self.issue_pair(&record.identity, record.role)?;
        let rotated = self
            .directory
            .swap_refresh_token(&record.identity, presented, &pair.refresh_token)
            .await
            .map_err(|source| AuthError::directory("swap_refresh_token", source))?;
        if !rotated {
            warn!(identity = %record.identity, "refresh rejected: concurrent rotation won");
            return Err(invalid());
        }

        info!(identity = %record.identity, "refresh token rotated");
        Ok(pair)
    }

    /// End the session named by `presented`; idempotent and best effort.
    ///
    /// The stored reference is cleared even when it no longer equals the
    /// presented token. Expired but correctly signed tokens are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] when the token cannot be decoded.
    #[instrument(name = "session.logout", skip_all)]
    pub async fn logout(&self, presented: &str) -> AuthResult<()> {
        let claims = self
            .decode_refresh(presented)
            .ok_or(AuthError::Validation {
                field: "refreshToken",
                reason: "refresh token could not be decoded",
            })?;

        let cleared = self
            .directory
            .set_refresh_token(&claims.sub, None)
            .await
            .map_err(|source| AuthError::directory("set_refresh_token", source))?;
        if cleared {
            info!(identity = %claims.sub, "session revoked");
        } else {
            debug!(identity = %claims.sub, "logout for unknown identity");
        }
        Ok(())
    }

    /// Load the public profile of `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] when no record exists.
    pub async fn profile(&self, identity: &str) -> AuthResult<Profile> {
        self.load(identity).await.map(|record| record.profile())
    }

    /// Replace the password of `identity` after re-checking the current one.
    ///
    /// The active session is revoked; the caller must log in again.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for an empty replacement,
    /// [`AuthError::Authentication`] when the current password is wrong, and
    /// [`AuthError::NotFound`] when the identity vanished.
    #[instrument(name = "session.change_password", skip(self, change))]
    pub async fn change_password(&self, identity: &str, change: PasswordChange) -> AuthResult<()> {
        let PasswordChange {
            current,
            replacement,
        } = change;
        require_password("newPassword", &replacement)?;

        let record = self.load(identity).await?;
        if !self
            .verify_password(current, record.password_hash.clone())
            .await?
        {
            return Err(AuthError::authentication(AuthFailure::InvalidCredentials));
        }

        let password_hash = self.hash_password(replacement).await?;
        let updated = self
            .directory
            .replace_password_hash(identity, &password_hash)
            .await
            .map_err(|source| AuthError::directory("replace_password_hash", source))?;
        if !updated {
            return Err(AuthError::NotFound {
                identity: identity.to_string(),
            });
        }

        info!("password changed; session revoked");
        Ok(())
    }

    async fn load(&self, identity: &str) -> AuthResult<CredentialRecord> {
        self.directory
            .find_by_identity(identity)
            .await
            .map_err(|source| AuthError::directory("find_by_identity", source))?
            .ok_or_else(|| AuthError::NotFound {
                identity: identity.to_string(),
            })
    }

    fn issue_pair(&self, identity: &str, role: Role) -> AuthResult<TokenPair> {
        let now = self.clock.now();
        let access_expires_at = now + self.config.access_ttl;
        let refresh_expires_at = now + self.config.refresh_ttl;

        let access = Claims::new(
            identity,
            Some(role),
            TokenKind::Access,
            now,
            access_expires_at,
        );
        let refresh = Claims::new(identity, None, TokenKind::Refresh, now, refresh_expires_at);

        let access_token = self
            .signer
            .sign(&access, &self.config.access_secret)
            .map_err(|source| AuthError::Signing { source })?;
        let refresh_token = self
            .signer
            .sign(&refresh, &self.config.refresh_secret)
            .map_err(|source| AuthError::Signing { source })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn decode_refresh(&self, token: &str) -> Option<Claims> {
        match self.signer.verify(token, &self.config.refresh_secret) {
            Ok(claims) if claims.typ == TokenKind::Refresh => Some(claims),
            Ok(_) => {
                debug!("refresh token rejected: wrong token kind");
                None
            }
            Err(err) => {
                debug!(error = %err, "refresh token rejected");
                None
            }
        }
    }

    async fn hash_password(&self, plaintext: String) -> AuthResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|_| AuthError::Hash {
                source: HashError::TaskFailed,
            })?
            .map_err(|source| AuthError::Hash { source })
    }

    async fn verify_password(&self, plaintext: String, verifier: String) -> AuthResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &verifier))
            .await
            .map_err(|_| AuthError::Hash {
                source: HashError::TaskFailed,
            })?
            .map_err(|source| AuthError::Hash { source })
    }
}

fn require_present(field: &'static str, value: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation {
            field,
            reason: "must not be empty",
        });
    }
    Ok(())
}

/// Passwords are taken verbatim, so only the empty string is missing.
fn require_password(field: &'static str, value: &str) -> AuthResult<()> {
    if value.is_empty() {
        return Err(AuthError::Validation {
            field,
            reason: "must not be empty",
        });
    }
    Ok(())
}

fn tokens_match(stored: Option<&str>, presented: &str) -> bool {
    stored.is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(presented.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::hasher::Argon2Hasher;
    use crate::memory::MemoryDirectory;
    use crate::policy::ElevationPolicy;
    use anyhow::Result;
    use chrono::{Duration, Utc};

    const ADMIN_CODE: &str = "open-sesame";

    struct Harness {
        manager: SessionManager,
        directory: Arc<MemoryDirectory>,
        clock: Arc<ManualClock>,
    }

    fn config() -> SessionConfig {
        SessionConfig::new("access-secret", "refresh-secret")
            .with_elevation(ElevationPolicy::shared_secret(Some(ADMIN_CODE.to_string())))
    }

    fn harness() -> Result<Harness> {
        let directory = Arc::new(MemoryDirectory::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let manager = SessionManager::new(
            config(),
            directory.clone(),
            Arc::new(Argon2Hasher::new(256, 1)?),
        )
        .with_clock(clock.clone());
        Ok(Harness {
            manager,
            directory,
            clock,
        })
    }

    fn registration(identity: &str, email: &str, password: &str) -> Registration {
        Registration {
            identity: identity.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            elevation_claim: None,
        }
    }

    fn is_auth_failure(err: &AuthError, expected: AuthFailure) -> bool {
        matches!(err, AuthError::Authentication { failure } if *failure == expected)
    }

    #[tokio::test]
    async fn register_stores_verifier_not_plaintext() -> Result<()> {
        let h = harness()?;
        let record = h
            .manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;

        assert_eq!(record.role, Role::User);
        assert!(record.refresh_token.is_none());
        assert_ne!(record.password_hash, "pw1");
        assert!(!record.password_hash.contains("pw1"));
        assert!(Argon2Hasher::new(256, 1)?.verify("pw1", &record.password_hash)?);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_and_identity() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;

        let email_err = h
            .manager
            .register(registration("alicia", "a@x.com", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(email_err, AuthError::Conflict { field: "email" }));

        let identity_err = h
            .manager
            .register(registration("alice", "other@x.com", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(
            identity_err,
            AuthError::Conflict { field: "username" }
        ));
        assert_eq!(h.directory.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_empty_fields() -> Result<()> {
        let h = harness()?;
        for (identity, email, password, field) in [
            ("", "a@x.com", "pw1", "username"),
            ("alice", " ", "pw1", "email"),
            ("alice", "a@x.com", "", "password"),
        ] {
            let err = h
                .manager
                .register(registration(identity, email, password))
                .await
                .unwrap_err();
            assert!(
                matches!(err, AuthError::Validation { field: got, .. } if got == field),
                "expected validation error on {field}, got {err:?}"
            );
        }
        assert!(h.directory.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_failures_are_indistinguishable() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;

        let wrong_password = h.manager.authenticate("a@x.com", "nope").await.unwrap_err();
        let unknown_email = h.manager.authenticate("b@x.com", "pw1").await.unwrap_err();

        assert!(is_auth_failure(&wrong_password, AuthFailure::InvalidCredentials));
        assert!(is_auth_failure(&unknown_email, AuthFailure::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn access_token_expires_after_fifteen_minutes() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let pair = h.manager.authenticate("a@x.com", "pw1").await?;

        h.clock.advance(Duration::minutes(14));
        let principal = h.manager.verify_access(&pair.access_token)?;
        assert_eq!(principal.identity, "alice");
        assert_eq!(principal.role, Role::User);

        h.clock.advance(Duration::minutes(2));
        let err = h.manager.verify_access(&pair.access_token).unwrap_err();
        assert!(is_auth_failure(&err, AuthFailure::InvalidAccessToken));
        Ok(())
    }

    #[tokio::test]
    async fn verify_access_rejects_empty_and_refresh_tokens() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let pair = h.manager.authenticate("a@x.com", "pw1").await?;

        for token in ["", "   ", "garbage", pair.refresh_token.as_str()] {
            let err = h.manager.verify_access(token).unwrap_err();
            assert!(is_auth_failure(&err, AuthFailure::InvalidAccessToken));
        }
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rotation_invalidates_previous_token() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let first = h.manager.authenticate("a@x.com", "pw1").await?;

        let second = h.manager.refresh(&first.refresh_token).await?;
        assert_ne!(second.refresh_token, first.refresh_token);

        let reuse = h.manager.refresh(&first.refresh_token).await.unwrap_err();
        assert!(is_auth_failure(&reuse, AuthFailure::InvalidRefreshToken));

        let third = h.manager.refresh(&second.refresh_token).await?;
        let stored = h.directory.find_by_identity("alice").await?.expect("record");
        assert_eq!(stored.refresh_token.as_deref(), Some(third.refresh_token.as_str()));
        assert_eq!(h.manager.verify_access(&third.access_token)?.identity, "alice");
        Ok(())
    }

    #[tokio::test]
    async fn access_token_is_not_a_refresh_token() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let pair = h.manager.authenticate("a@x.com", "pw1").await?;

        let err = h.manager.refresh(&pair.access_token).await.unwrap_err();
        assert!(is_auth_failure(&err, AuthFailure::InvalidRefreshToken));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_token_expires_after_seven_days() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let pair = h.manager.authenticate("a@x.com", "pw1").await?;

        h.clock.advance(Duration::days(7) + Duration::minutes(1));
        let err = h.manager.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(is_auth_failure(&err, AuthFailure::InvalidRefreshToken));
        Ok(())
    }

    #[tokio::test]
    async fn new_login_replaces_previous_session() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let laptop = h.manager.authenticate("a@x.com", "pw1").await?;
        let phone = h.manager.authenticate("a@x.com", "pw1").await?;

        assert!(h.manager.refresh(&laptop.refresh_token).await.is_err());
        assert!(h.manager.refresh(&phone.refresh_token).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn logout_then_refresh_fails() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let pair = h.manager.authenticate("a@x.com", "pw1").await?;

        h.manager.logout(&pair.refresh_token).await?;
        let stored = h.directory.find_by_identity("alice").await?.expect("record");
        assert!(stored.refresh_token.is_none());

        let err = h.manager.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(is_auth_failure(&err, AuthFailure::InvalidRefreshToken));
        Ok(())
    }

    #[tokio::test]
    async fn logout_is_idempotent_and_ignores_stale_tokens() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let stale = h.manager.authenticate("a@x.com", "pw1").await?;
        let current = h.manager.refresh(&stale.refresh_token).await?;

        h.manager.logout(&stale.refresh_token).await?;
        h.manager.logout(&stale.refresh_token).await?;
        assert!(h.manager.refresh(&current.refresh_token).await.is_err());
        Ok(())
    }

    /// Tokens signed with the shared secrets for an identity `h` never stored.
    async fn foreign_pair(h: &Harness, identity: &str) -> Result<TokenPair> {
        let elsewhere = SessionManager::new(
            config(),
            Arc::new(MemoryDirectory::new()),
            Arc::new(Argon2Hasher::new(256, 1)?),
        )
        .with_clock(h.clock.clone());
        elsewhere
            .register(registration(identity, "ghost@x.com", "pw1"))
            .await?;
        Ok(elsewhere.authenticate("ghost@x.com", "pw1").await?)
    }

    #[tokio::test]
    async fn refresh_rejects_identity_missing_from_directory() -> Result<()> {
        let h = harness()?;
        let pair = foreign_pair(&h, "ghost").await?;
        assert_eq!(h.manager.verify_access(&pair.access_token)?.identity, "ghost");

        let err = h.manager.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(is_auth_failure(&err, AuthFailure::InvalidRefreshToken));
        assert!(h.directory.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn logout_for_unknown_identity_succeeds() -> Result<()> {
        let h = harness()?;
        let pair = foreign_pair(&h, "ghost").await?;

        h.manager.logout(&pair.refresh_token).await?;
        h.manager.logout(&pair.refresh_token).await?;
        assert!(h.directory.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn whitespace_passwords_are_taken_verbatim() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("bob", "b@x.com", "   "))
            .await?;
        let pair = h.manager.authenticate("b@x.com", "   ").await?;
        assert_eq!(h.manager.verify_access(&pair.access_token)?.identity, "bob");

        let err = h.manager.authenticate("b@x.com", "  ").await.unwrap_err();
        assert!(is_auth_failure(&err, AuthFailure::InvalidCredentials));
        let empty = h.manager.authenticate("b@x.com", "").await.unwrap_err();
        assert!(matches!(empty, AuthError::Validation { field: "password", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn logout_rejects_undecodable_tokens() -> Result<()> {
        let h = harness()?;
        let err = h.manager.logout("not-a-token").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation {
                field: "refreshToken",
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn end_to_end_session_lifecycle() -> Result<()> {
        let h = harness()?;
        let record = h
            .manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        assert_eq!(record.identity, "alice");

        let pair = h.manager.authenticate("a@x.com", "pw1").await?;
        assert_eq!(
            h.manager.verify_access(&pair.access_token)?,
            Principal {
                identity: "alice".to_string(),
                role: Role::User,
            }
        );

        let rotated = h.manager.refresh(&pair.refresh_token).await?;
        assert!(h.manager.verify_access(&rotated.access_token).is_ok());
        assert!(h.manager.refresh(&pair.refresh_token).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn admin_elevation_requires_matching_claim() -> Result<()> {
        let h = harness()?;
        let mut root = registration("root", "root@x.com", "pw1");
        root.elevation_claim = Some(ADMIN_CODE.to_string());
        let mut impostor = registration("mallory", "m@x.com", "pw1");
        impostor.elevation_claim = Some("guess".to_string());

        assert_eq!(h.manager.register(root).await?.role, Role::Admin);
        assert_eq!(h.manager.register(impostor).await?.role, Role::User);

        let admin = h.manager.authenticate("root@x.com", "pw1").await?;
        let user = h.manager.authenticate("m@x.com", "pw1").await?;

        let principal = h.manager.verify_role(&admin.access_token, Role::Admin)?;
        assert_eq!(principal.role, Role::Admin);
        let err = h
            .manager
            .verify_role(&user.access_token, Role::Admin)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Authorization {
                required: Role::Admin,
                actual: Role::User
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn admin_role_survives_refresh() -> Result<()> {
        let h = harness()?;
        let mut root = registration("root", "root@x.com", "pw1");
        root.elevation_claim = Some(ADMIN_CODE.to_string());
        h.manager.register(root).await?;

        let pair = h.manager.authenticate("root@x.com", "pw1").await?;
        let rotated = h.manager.refresh(&pair.refresh_token).await?;
        assert!(h.manager.verify_role(&rotated.access_token, Role::Admin).is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn change_password_requires_current_and_revokes_session() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let pair = h.manager.authenticate("a@x.com", "pw1").await?;

        let wrong = h
            .manager
            .change_password(
                "alice",
                PasswordChange {
                    current: "nope".into(),
                    replacement: "pw2".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(is_auth_failure(&wrong, AuthFailure::InvalidCredentials));

        h.manager
            .change_password(
                "alice",
                PasswordChange {
                    current: "pw1".into(),
                    replacement: "pw2".into(),
                },
            )
            .await?;

        assert!(h.manager.refresh(&pair.refresh_token).await.is_err());
        assert!(h.manager.authenticate("a@x.com", "pw1").await.is_err());
        assert!(h.manager.authenticate("a@x.com", "pw2").await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn profile_hides_credentials() -> Result<()> {
        let h = harness()?;
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;

        let profile = h.manager.profile("alice").await?;
        assert_eq!(profile.email, "a@x.com");
        assert_eq!(profile.role, Role::User);
        assert!(matches!(
            h.manager.profile("ghost").await,
            Err(AuthError::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_refreshes_have_one_winner() -> Result<()> {
        let h = Arc::new(harness()?);
        h.manager
            .register(registration("alice", "a@x.com", "pw1"))
            .await?;
        let pair = h.manager.authenticate("a@x.com", "pw1").await?;

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let h = Arc::clone(&h);
            let token = pair.refresh_token.clone();
            tasks.push(tokio::spawn(async move { h.manager.refresh(&token).await }));
        }
        let mut winners = 0;
        for task in tasks {
            if task.await?.is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        Ok(())
    }
}
