//! Service configuration assembled from environment variables.

use std::fmt;
use std::net::SocketAddr;

use chrono::Duration;
use turnstile_auth::{Argon2Hasher, ElevationPolicy, SessionConfig};
use turnstile_telemetry::LogFormat;

use crate::error::{ConfigError, ConfigResult};
use crate::validate::{non_blank, parse_or, positive, required};

/// Environment variable names read by [`ServiceConfig::from_env`].
pub mod env {
    /// HTTP listener address.
    pub const BIND_ADDR: &str = "TURNSTILE_BIND_ADDR";
    /// `PostgreSQL` connection string; in-memory stores when unset.
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Access-token HMAC secret.
    pub const SECRET_KEY: &str = "SECRET_KEY";
    /// Refresh-token HMAC secret.
    pub const REFRESH_SECRET: &str = "REFRESH_SECRET";
    /// Shared elevation secret.
    pub const ADMIN_CODE: &str = "ADMIN_CODE";
    /// Access-token lifetime in seconds.
    pub const ACCESS_TTL_SECS: &str = "TURNSTILE_ACCESS_TTL_SECS";
    /// Refresh-token lifetime in seconds.
    pub const REFRESH_TTL_SECS: &str = "TURNSTILE_REFRESH_TTL_SECS";
    /// Argon2 memory cost in KiB.
    pub const HASH_MEMORY_KIB: &str = "TURNSTILE_HASH_MEMORY_KIB";
    /// Argon2 iteration count.
    pub const HASH_ITERATIONS: &str = "TURNSTILE_HASH_ITERATIONS";
    /// `json` or `pretty`.
    pub const LOG_FORMAT: &str = "TURNSTILE_LOG_FORMAT";
    /// Default log directive when `RUST_LOG` is unset.
    pub const LOG_LEVEL: &str = "TURNSTILE_LOG_LEVEL";
}

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_HASH_MEMORY_KIB: u32 = 19_456;
const DEFAULT_HASH_ITERATIONS: u32 = 2;

/// Fully validated service configuration.
#[derive(Clone)]
pub struct ServiceConfig {
    /// HTTP listener address.
    pub bind_addr: SocketAddr,
    /// Database connection string; `None` selects in-memory stores.
    pub database_url: Option<String>,
    /// Access-token secret.
    pub access_secret: String,
    /// Refresh-token secret.
    pub refresh_secret: String,
    /// Shared elevation secret.
    pub admin_code: Option<String>,
    /// Access-token lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh-token lifetime in seconds.
    pub refresh_ttl_secs: i64,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: u32,
    /// Argon2 iteration count.
    pub hash_iterations: u32,
    /// Log output format.
    pub log_format: LogFormat,
    /// Default log directive.
    pub log_level: String,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value is invalid.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr: SocketAddr = parse_or(
            env::BIND_ADDR,
            lookup(env::BIND_ADDR),
            DEFAULT_BIND_ADDR
                .parse()
                .map_err(|_| ConfigError::InvalidField {
                    field: env::BIND_ADDR,
                    reason: "default bind address is invalid",
                    value: None,
                })?,
            "must be a socket address",
        )?;

        let access_secret = required(env::SECRET_KEY, lookup(env::SECRET_KEY))?;
        let refresh_secret = required(env::REFRESH_SECRET, lookup(env::REFRESH_SECRET))?;
        if access_secret == refresh_secret {
            return Err(ConfigError::InvalidField {
                field: env::REFRESH_SECRET,
                reason: "must differ from SECRET_KEY",
                value: None,
            });
        }

        let access_ttl_secs = positive(
            env::ACCESS_TTL_SECS,
            lookup(env::ACCESS_TTL_SECS),
            turnstile_auth::config::DEFAULT_ACCESS_TTL_SECS,
        )?;
        let refresh_ttl_secs = positive(
            env::REFRESH_TTL_SECS,
            lookup(env::REFRESH_TTL_SECS),
            turnstile_auth::config::DEFAULT_REFRESH_TTL_SECS,
        )?;
        if refresh_ttl_secs <= access_ttl_secs {
            return Err(ConfigError::InvalidField {
                field: env::REFRESH_TTL_SECS,
                reason: "must exceed the access token lifetime",
                value: Some(refresh_ttl_secs.to_string()),
            });
        }

        let log_format = match non_blank(lookup(env::LOG_FORMAT)) {
            None => LogFormat::infer(),
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidField {
                field: env::LOG_FORMAT,
                reason: "must be `json` or `pretty`",
                value: Some(raw),
            })?,
        };

        let config = Self {
            bind_addr,
            database_url: non_blank(lookup(env::DATABASE_URL)),
            access_secret,
            refresh_secret,
            admin_code: non_blank(lookup(env::ADMIN_CODE)),
            access_ttl_secs,
            refresh_ttl_secs,
            hash_memory_kib: positive(
                env::HASH_MEMORY_KIB,
                lookup(env::HASH_MEMORY_KIB),
                DEFAULT_HASH_MEMORY_KIB,
            )?,
            hash_iterations: positive(
                env::HASH_ITERATIONS,
                lookup(env::HASH_ITERATIONS),
                DEFAULT_HASH_ITERATIONS,
            )?,
            log_format,
            log_level: non_blank(lookup(env::LOG_LEVEL))
                .unwrap_or_else(|| turnstile_telemetry::DEFAULT_LOG_LEVEL.to_string()),
        };
        config.hasher()?;
        Ok(config)
    }

    /// Session manager settings derived from this configuration.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.access_secret.as_bytes(), self.refresh_secret.as_bytes())
            .with_lifetimes(
                Duration::seconds(self.access_ttl_secs),
                Duration::seconds(self.refresh_ttl_secs),
            )
            .with_elevation(ElevationPolicy::shared_secret(self.admin_code.clone()))
    }

    /// Password hasher using the configured argon2 costs.
    ///
    /// # Errors
    ///
    /// Returns an error when argon2 rejects the cost parameters.
    pub fn hasher(&self) -> ConfigResult<Argon2Hasher> {
        Argon2Hasher::new(self.hash_memory_kib, self.hash_iterations).map_err(|_| {
            ConfigError::InvalidField {
                field: env::HASH_MEMORY_KIB,
                reason: "rejected by argon2",
                value: Some(self.hash_memory_kib.to_string()),
            }
        })
    }

    /// Whether a database connection string is configured.
    #[must_use]
    pub const fn uses_database(&self) -> bool {
        self.database_url.is_some()
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServiceConfig")
            .field("bind_addr", &self.bind_addr)
            .field("uses_database", &self.uses_database())
            .field("admin_code_set", &self.admin_code.is_some())
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .field("hash_iterations", &self.hash_iterations)
            .field("log_format", &self.log_format)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}
