//! Explicit configuration injected into the session manager.

use std::fmt;

use chrono::Duration;

use crate::policy::ElevationPolicy;

/// Default access token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;
/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Signing secrets, token lifetimes, and the elevation policy.
#[derive(Clone)]
pub struct SessionConfig {
    /// HMAC secret for access tokens.
    pub access_secret: Vec<u8>,
    /// HMAC secret for refresh tokens.
    pub refresh_secret: Vec<u8>,
    /// Access token lifetime.
    pub access_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_ttl: Duration,
    /// Role elevation strategy applied on registration.
    pub elevation: ElevationPolicy,
}

impl SessionConfig {
    /// Configuration with default lifetimes and no elevation.
    #[must_use]
    pub fn new(access_secret: impl Into<Vec<u8>>, refresh_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl: Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
            elevation: ElevationPolicy::NoElevation,
        }
    }

    /// Replace the elevation policy.
    #[must_use]
    pub fn with_elevation(mut self, elevation: ElevationPolicy) -> Self {
        self.elevation = elevation;
        self
    }

    /// Override both token lifetimes.
    #[must_use]
    pub fn with_lifetimes(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("elevation", &self.elevation)
            .finish_non_exhaustive()
    }
}
