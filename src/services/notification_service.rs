use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound message capability. Delivery is best-effort.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body_html: &str) -> Result<(), NotifyError>;
}

/// Posts messages as JSON to an HTTP mail relay.
#[derive(Clone)]
pub struct MailRelayNotifier {
    client: Client,
    relay_url: String,
    secret: Option<String>,
}

impl MailRelayNotifier {
    pub fn new(relay_url: String, secret: Option<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            relay_url,
            secret,
        })
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn send(&self, to: &str, subject: &str, body_html: &str) -> Result<(), NotifyError> {
        let mut request = self.client.post(&self.relay_url).json(&json!({
            "to": to,
            "subject": subject,
            "html": body_html,
        }));
        if let Some(secret) = &self.secret {
            request = request.header("X-Relay-Secret", secret);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Used when no relay is configured: the message is only logged.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, _body_html: &str) -> Result<(), NotifyError> {
        tracing::info!(to, subject, "Notification (no mail relay configured)");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

/// Sends on a background task. Failures are logged and never reach the
/// caller.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        match notifier
            .send(&notification.to, &notification.subject, &notification.body_html)
            .await
        {
            Ok(()) => tracing::info!("Notification sent: {}", notification.subject),
            Err(e) => tracing::warn!(error = %e, "Notification failed: {}", notification.subject),
        }
    });
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
