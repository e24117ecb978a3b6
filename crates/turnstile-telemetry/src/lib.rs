#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Telemetry primitives shared across the Turnstile workspace.
//!
//! Layout: `init.rs` (subscriber setup and log formats), `layers.rs`
//! (request-id middleware), `metrics.rs` (Prometheus registry), `error.rs`.

pub mod error;
pub mod init;
pub mod layers;
pub mod metrics;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use layers::{propagate_request_id_layer, set_request_id_layer};
pub use metrics::{AuthOutcome, Metrics, MetricsSnapshot};
