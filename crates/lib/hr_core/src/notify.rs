//! Outbound notification seam.
//!
//! The auth core only renders a recipient, subject and HTML body; delivery
//! belongs to a [`Notifier`]. `LogNotifier` is for local development,
//! `RelayNotifier` hands messages to an HTTP mail relay.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub html_body: String,
}

/// Errors from a delivery attempt.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Relay rejected message: HTTP {0}")]
    Rejected(u16),

    #[error("Dispatch timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Notifier error: {0}")]
    Other(String),
}

/// Delivers a rendered message to one address.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, address: &str, subject: &str, html_body: &str) -> Result<(), NotifyError>;
}

/// Send `message` to `address`, giving up after `timeout`.
pub async fn dispatch(
    notifier: &dyn Notifier,
    timeout: Duration,
    address: &str,
    message: &Message,
) -> Result<(), NotifyError> {
    match tokio::time::timeout(
        timeout,
        notifier.send(address, &message.subject, &message.html_body),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(NotifyError::TimedOut(timeout)),
    }
}

/// Writes a log line instead of delivering. Bodies are not logged since
/// they may carry reset codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, address: &str, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        info!(to = address, subject, body_len = html_body.len(), "notification (log only)");
        Ok(())
    }
}

/// JSON payload accepted by the mail relay.
#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// POSTs each message as JSON to a mail-relay endpoint.
#[derive(Debug, Clone)]
pub struct RelayNotifier {
    client: reqwest::Client,
    endpoint: String,
    sender: String,
}

impl RelayNotifier {
    pub fn new(endpoint: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Notifier for RelayNotifier {
    async fn send(&self, address: &str, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        let payload = RelayPayload {
            from: &self.sender,
            to: address,
            subject,
            html: html_body,
        };
        let resp = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        debug!(to = address, status = status.as_u16(), "relay accepted message");
        Ok(())
    }
}
