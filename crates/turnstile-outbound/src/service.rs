//! Validation and bookkeeping over a [`Mailer`] and an [`UploadSink`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::error::{OutboundError, OutboundResult};
use crate::mail::{LogMailer, Mailer, OutgoingMail};
use crate::upload::{MAX_UPLOAD_BYTES, MemoryUploadSink, StoredUpload, Upload, UploadSink};

/// Public prefix under which stored uploads are served.
const UPLOAD_PATH_PREFIX: &str = "/uploads/";

/// Outbound operations shared by HTTP handlers.
#[derive(Clone)]
pub struct OutboundService {
    mailer: Arc<dyn Mailer>,
    uploads: Arc<dyn UploadSink>,
}

impl OutboundService {
    /// Wrap the given transports.
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, uploads: Arc<dyn UploadSink>) -> Self {
        Self { mailer, uploads }
    }

    /// Logging mailer and in-memory upload storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(LogMailer::new()), Arc::new(MemoryUploadSink::new()))
    }

    /// Send `mail` on behalf of `sender`.
    ///
    /// # Errors
    ///
    /// Returns [`OutboundError::Validation`] when `to`, `subject`, or `text`
    /// is blank, and the transport's error otherwise.
    #[instrument(name = "outbound.send_mail", skip(self, mail))]
    pub async fn send_mail(&self, sender: &str, mail: OutgoingMail) -> OutboundResult<()> {
        require("to", &mail.to)?;
        require("subject", &mail.subject)?;
        require("text", &mail.text)?;
        self.mailer.send(mail).await?;
        info!("mail sent");
        Ok(())
    }

    /// Store `upload` for `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`OutboundError::Validation`] for a blank name, an empty file,
    /// or a file over [`MAX_UPLOAD_BYTES`], and the sink's error otherwise.
    #[instrument(name = "outbound.store_upload", skip(self, upload))]
    pub async fn store_upload(&self, owner: &str, upload: Upload) -> OutboundResult<StoredUpload> {
        require("fileName", &upload.original_name)?;
        if upload.bytes.is_empty() {
            return Err(OutboundError::Validation {
                field: "content",
                reason: "no file uploaded",
            });
        }
        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(OutboundError::Validation {
                field: "content",
                reason: "file exceeds the 5 MiB limit",
            });
        }

        let filename = upload.stored_name(Utc::now());
        let Upload {
            original_name,
            content_type,
            bytes,
        } = upload;
        let size = bytes.len() as u64;
        self.uploads.store(&filename, bytes).await?;
        info!(%filename, size, content_type = content_type.as_deref(), "upload stored");
        Ok(StoredUpload {
            original_name,
            path: format!("{UPLOAD_PATH_PREFIX}{filename}"),
            filename,
            size,
        })
    }
}

fn require(field: &'static str, value: &str) -> OutboundResult<()> {
    if value.trim().is_empty() {
        return Err(OutboundError::Validation {
            field,
            reason: "must not be empty",
        });
    }
    Ok(())
}
