#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Environment-driven service configuration.
//!
//! Layout: `error.rs` (`ConfigError`), `model.rs` (`ServiceConfig` and the
//! variable names it reads), `validate.rs` (parsing helpers).

pub mod error;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{ServiceConfig, env};
