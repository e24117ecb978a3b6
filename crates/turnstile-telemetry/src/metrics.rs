//! Prometheus-backed metrics registry and snapshot helpers.

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Outcome label recorded on authentication events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The operation completed.
    Success,
    /// The caller was rejected.
    Rejected,
    /// An infrastructure fault interrupted the operation.
    Error,
}

impl AuthOutcome {
    const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Rejected => "rejected",
            Self::Error => "error",
        }
    }
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    auth_events_total: IntCounterVec,
}

/// Session totals used by the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Successful logins.
    pub logins_total: u64,
    /// Rejected logins.
    pub login_rejections_total: u64,
    /// Successful refresh rotations.
    pub refreshes_total: u64,
}

impl Metrics {
    /// Construct a registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let http_requests_total = counter(
            &registry,
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let auth_events_total = counter(
            &registry,
            "auth_events_total",
            "Session operations by event and outcome",
            &["event", "outcome"],
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                auth_events_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Record a session operation (`register`, `login`, `refresh`, `logout`, ...).
    pub fn inc_auth_event(&self, event: &str, outcome: AuthOutcome) {
        self.inner
            .auth_events_total
            .with_label_values(&[event, outcome.label()])
            .inc();
    }

    /// Render the registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the buffer is not UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|source| TelemetryError::Encode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::NonUtf8 { source })
    }

    /// Point-in-time totals for health reporting.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let auth = |event: &str, outcome: AuthOutcome| {
            self.inner
                .auth_events_total
                .with_label_values(&[event, outcome.label()])
                .get()
        };
        MetricsSnapshot {
            logins_total: auth("login", AuthOutcome::Success),
            login_rejections_total: auth("login", AuthOutcome::Rejected),
            refreshes_total: auth("refresh", AuthOutcome::Success),
        }
    }
}

fn counter(
    registry: &Registry,
    name: &'static str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec> {
    let collector = |source| TelemetryError::Collector { name, source };
    let vec = IntCounterVec::new(Opts::new(name, help), labels).map_err(collector)?;
    registry
        .register(Box::new(vec.clone()))
        .map_err(collector)?;
    Ok(vec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_updates() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/login", 200);
        metrics.inc_http_request("/login", 401);
        metrics.inc_http_request("/health", 200);
        metrics.inc_auth_event("login", AuthOutcome::Success);
        metrics.inc_auth_event("login", AuthOutcome::Rejected);
        metrics.inc_auth_event("login", AuthOutcome::Rejected);
        metrics.inc_auth_event("refresh", AuthOutcome::Success);

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                logins_total: 1,
                login_rejections_total: 2,
                refreshes_total: 1,
            }
        );

        let rendered = metrics.render()?;
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains(r#"auth_events_total{event="login",outcome="rejected"} 2"#));
        Ok(())
    }

    #[test]
    fn registries_are_independent() -> Result<()> {
        let first = Metrics::new()?;
        let second = Metrics::new()?;
        first.inc_auth_event("logout", AuthOutcome::Success);
        assert!(!second.render()?.contains("logout"));
        Ok(())
    }
}
