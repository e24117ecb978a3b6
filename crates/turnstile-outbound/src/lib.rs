#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Outbound collaborators: mail delivery and file uploads.
//!
//! Transports live behind [`Mailer`] and [`UploadSink`]; the in-process
//! implementations log and keep what they were handed.

pub mod error;
pub mod mail;
pub mod service;
pub mod upload;

pub use error::{OutboundError, OutboundResult};
pub use mail::{LogMailer, Mailer, OutgoingMail};
pub use service::OutboundService;
pub use upload::{MAX_UPLOAD_BYTES, MemoryUploadSink, StoredUpload, Upload, UploadSink};
