#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Binary entrypoint for the Turnstile service.

use turnstile_app::{AppResult, run_app};

/// Boot the service and block until shutdown.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
