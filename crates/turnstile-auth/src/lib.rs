#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Session and credential management for the Turnstile services.
//!
//! Layout: `model.rs` (credential records, roles, token pairs), `manager.rs`
//! (`SessionManager` state machine), `directory.rs` / `memory.rs` (user
//! directory contract + in-memory backend), `token.rs` (HS256 signer),
//! `hasher.rs` (argon2 verifiers), `clock.rs`, `policy.rs` (role elevation),
//! `config.rs` (`SessionConfig`).

pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod hasher;
pub mod manager;
pub mod memory;
pub mod model;
pub mod policy;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use directory::{DirectoryError, DirectoryResult, UserDirectory};
pub use error::{AuthError, AuthFailure, AuthResult};
pub use hasher::{Argon2Hasher, CredentialHasher, HashError};
pub use manager::SessionManager;
pub use memory::MemoryDirectory;
pub use model::{
    CredentialRecord, InvalidRole, NewCredential, PasswordChange, Principal, Profile, Registration, Role,
    TokenPair,
};
pub use policy::{ElevationApprover, ElevationPolicy};
pub use token::{Claims, Hs256Signer, TokenError, TokenKind, TokenSigner};
