#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! PostgreSQL persistence for credential records and todo items.
//!
//! Layout: `pool.rs` (connect + migrations), `users.rs` (`PgUserDirectory`),
//! `todos.rs` (`PgTodoStore`), `error.rs` (`DataError`).

pub mod error;
pub mod pool;
pub mod todos;
pub mod users;

pub use error::{DataError, Result as DataResult};
pub use pool::{connect, migrate};
pub use todos::PgTodoStore;
pub use users::PgUserDirectory;
