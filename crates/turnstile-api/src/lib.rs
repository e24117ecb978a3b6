#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! HTTP surface for Turnstile: session endpoints, owner-scoped todos, mail
//! and upload endpoints, health and Prometheus metrics, with RFC 9457 problem
//! responses.

pub mod error;
mod http;
pub mod models;
mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
