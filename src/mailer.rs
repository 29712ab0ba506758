use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::{config::MailConfig, http::HttpClient};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

/// Sends through an HTTP mail API. An empty `api_url` turns sending into a
/// no-op so local setups run without mail credentials.
pub struct HttpMailer {
    http: HttpClient,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            http: HttpClient::new(),
            config,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        if self.config.api_url.is_empty() {
            debug!(%to, %subject, "mail disabled, skipping send");
            return Ok(());
        }
        let request = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "from": self.config.from,
                "to": to,
                "subject": subject,
                "html": html,
            }));
        let resp = self.http.send_with_retry(request).await?;
        anyhow::ensure!(
            resp.status().is_success(),
            "mail api returned {}",
            resp.status()
        );
        Ok(())
    }
}

pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, _to: &str, _subject: &str, _html: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

// --- message bodies ---

pub fn request_received_html(name: &str, kind: &str, total_amount: i64, currency: &str) -> String {
    format!(
        "<p>Hello {name},</p>\
         <p>We received your {kind} request. The total comes to \
         <strong>{total_amount} {currency}</strong>.</p>\
         <p>Our team will review it shortly and you will get another email \
         once a decision is made.</p>\
         <p>Offisho Transport</p>"
    )
}

pub fn request_status_html(name: &str, kind: &str, status: &str) -> String {
    format!(
        "<p>Hello {name},</p>\
         <p>Your {kind} request has been <strong>{status}</strong>.</p>\
         <p>Log in to your account for the details.</p>\
         <p>Offisho Transport</p>"
    )
}

pub fn contact_copy_html(name: &str, email: &str, subject: Option<&str>, body: &str) -> String {
    format!(
        "<p>New contact message from <strong>{name}</strong> &lt;{email}&gt;</p>\
         <p>Subject: {}</p>\
         <blockquote>{body}</blockquote>",
        subject.unwrap_or("(none)")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_received_mentions_amount_and_kind() {
        let html = request_received_html("Alice", "rent", 170_000, "UGX");
        assert!(html.contains("Alice"));
        assert!(html.contains("rent request"));
        assert!(html.contains("170000 UGX"));
    }

    #[test]
    fn status_mail_carries_new_status() {
        let html = request_status_html("Bob", "buy", "approved");
        assert!(html.contains("buy request"));
        assert!(html.contains("approved"));
    }

    #[test]
    fn contact_copy_defaults_missing_subject() {
        let html = contact_copy_html("Carol", "carol@example.com", None, "hi there");
        assert!(html.contains("carol@example.com"));
        assert!(html.contains("(none)"));
        assert!(html.contains("hi there"));
    }
}
