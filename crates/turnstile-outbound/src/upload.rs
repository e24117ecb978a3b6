//! Uploaded files and the storage contract.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::OutboundResult;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A decoded upload as received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Name the client gave the file.
    pub original_name: String,
    /// Declared media type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Server-side name: `file-<millis>-<id>` plus the original extension
    /// when it is plain ASCII alphanumerics. Client paths are never reused.
    #[must_use]
    pub fn stored_name(&self, now: DateTime<Utc>) -> String {
        let extension = Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        format!(
            "file-{}-{}{extension}",
            now.timestamp_millis(),
            Uuid::new_v4().simple()
        )
    }
}

/// Where a stored upload can be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    /// Name the client gave the file.
    pub original_name: String,
    /// Server-side name.
    pub filename: String,
    /// Public path of the stored file.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

/// File storage.
#[async_trait]
pub trait UploadSink: Send + Sync {
    /// Persist `bytes` under `filename`, which is unique per upload.
    async fn store(&self, filename: &str, bytes: Vec<u8>) -> OutboundResult<()>;
}

/// Process-local file storage keyed by server-side name.
#[derive(Default)]
pub struct MemoryUploadSink {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryUploadSink {
    /// Construct an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents stored under `filename`.
    pub async fn get(&self, filename: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(filename).cloned()
    }

    /// Number of stored files.
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    /// Whether nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl UploadSink for MemoryUploadSink {
    async fn store(&self, filename: &str, bytes: Vec<u8>) -> OutboundResult<()> {
        self.files.write().await.insert(filename.to_string(), bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> Upload {
        Upload {
            original_name: name.to_string(),
            content_type: None,
            bytes: b"hello".to_vec(),
        }
    }

    #[test]
    fn stored_name_keeps_only_safe_extensions() {
        let now = Utc::now();
        let prefix = format!("file-{}-", now.timestamp_millis());

        let png = upload("Cat.PNG").stored_name(now);
        assert!(png.starts_with(&prefix));
        assert!(png.ends_with(".png"));

        let bare = upload("README").stored_name(now);
        assert!(!bare.contains('.'));

        let sneaky = upload("../../etc/passwd").stored_name(now);
        assert!(!sneaky.contains('/'));
        assert!(!sneaky.contains(".."));

        let odd = upload("notes.t x t").stored_name(now);
        assert!(!odd.contains(' '));
    }

    #[test]
    fn stored_names_are_unique_within_a_millisecond() {
        let now = Utc::now();
        let file = upload("a.txt");
        assert_ne!(file.stored_name(now), file.stored_name(now));
    }

    #[tokio::test]
    async fn memory_sink_keeps_contents() -> OutboundResult<()> {
        let sink = MemoryUploadSink::new();
        assert!(sink.is_empty().await);
        sink.store("file-1.txt", b"hi".to_vec()).await?;
        assert_eq!(sink.len().await, 1);
        assert_eq!(sink.get("file-1.txt").await.as_deref(), Some(&b"hi"[..]));
        assert!(sink.get("file-2.txt").await.is_none());
        Ok(())
    }
}
