//! Outgoing mail and the transport contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::OutboundResult;

/// A plain-text message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingMail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
}

/// Mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Hand `mail` to the transport. Input is already validated.
    async fn send(&self, mail: OutgoingMail) -> OutboundResult<()>;
}

/// Transport that logs each message and keeps it in memory.
#[derive(Default)]
pub struct LogMailer {
    sent: RwLock<Vec<OutgoingMail>>,
}

impl LogMailer {
    /// Construct an empty mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages accepted so far, oldest first.
    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> OutboundResult<()> {
        info!(to = %mail.to, subject = %mail.subject, "mail accepted");
        self.sent.write().await.push(mail);
        Ok(())
    }
}
