//! Mailbox access for steps that check outgoing email.
//!
//! [`MailRetriever`] holds the polling logic and works over any [`Mailbox`];
//! [`GmailMailbox`] is the Gmail REST implementation.

mod gmail;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::Timing;

pub use gmail::{default_token_path, GmailMailbox, StoredToken};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mail JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("mail API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail authorization failed: {0}")]
    Auth(String),

    #[error("message {0} has no text body")]
    UnsupportedMessage(String),

    #[error("message body is not valid base64url: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("no mail arrived within {}s", .0.as_secs())]
    Timeout(Duration),
}

pub type MailResult<T> = std::result::Result<T, MailError>;

/// A remote inbox.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Message ids, newest first.
    async fn list_ids(&self) -> MailResult<Vec<String>>;

    async fn read_body(&self, id: &str) -> MailResult<String>;

    async fn delete(&self, id: &str) -> MailResult<()>;
}

pub struct MailRetriever {
    mailbox: Arc<dyn Mailbox>,
    poll_interval: Duration,
    timeout: Duration,
}

impl MailRetriever {
    pub fn new(mailbox: Arc<dyn Mailbox>, timing: &Timing) -> Self {
        Self {
            mailbox,
            poll_interval: timing.mail_poll_interval.max(Duration::from_millis(1)),
            timeout: timing.mail_timeout,
        }
    }

    /// Empty the inbox. Returns the number of messages deleted.
    pub async fn delete_all_mail(&self) -> MailResult<usize> {
        tracing::info!("Deleting mail...");
        let ids = self.mailbox.list_ids().await?;
        if ids.is_empty() {
            tracing::info!("No mail found");
            return Ok(0);
        }

        futures::future::try_join_all(ids.iter().map(|id| self.mailbox.delete(id))).await?;
        tracing::info!("Deleted {} message(s)", ids.len());
        Ok(ids.len())
    }

    /// Wait for at least one message and return the body of the first listed.
    pub async fn wait_and_read_first_email(&self) -> MailResult<String> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let ids = self.mailbox.list_ids().await?;
            if let Some(id) = ids.first() {
                tracing::debug!("Reading message {}", id);
                return self.mailbox.read_body(id).await;
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(MailError::Timeout(self.timeout));
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}
