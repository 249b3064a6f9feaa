// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Transactional email dispatch.
//!
//! Renders a contact submission as both text/plain and text/html and
//! submits it to the SendGrid v3 mail/send API. Reply-to is set to the
//! submitter so operators can answer directly from their client.
//!
//! Delivery failures are masked from the end user: the handler maps
//! them to a 200-shaped response while the provider's status and body
//! are logged server-side only.

use crate::config::EmailConfig;
use serde_json::json;
use tracing::{info, warn};

/// A contact submission ready for delivery.
#[derive(Debug, Clone, Copy)]
pub struct ContactMessage<'a> {
    pub email: &'a str,
    pub company: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub subject: &'a str,
    pub message: &'a str,
}

/// Fully rendered notification, derived deterministically from one
/// submission.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    pub to: String,
    pub from: String,
    pub from_name: String,
    pub reply_to: String,
    pub subject_line: String,
    pub text_body: String,
    pub html_body: String,
}

/// Why delivery did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// Provider answered with a non-2xx status
    Rejected { status: u16 },
    /// The provider could not be reached
    Unreachable,
}

impl DeliveryFailure {
    /// Generic body returned to the caller; provider detail stays in
    /// the server log.
    pub fn masked_message(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "Email failed",
            Self::Unreachable => "Email service unreachable.",
        }
    }
}

/// Outcome of a dispatch attempt.
#[derive(Debug, Clone, Copy)]
pub enum DispatchOutcome {
    /// Provider accepted the message
    Sent,
    /// Provider rejected the message or was unreachable
    DeliveryFailed(DeliveryFailure),
    /// No delivery credential is configured
    NotConfigured,
}

/// Transactional email client.
pub struct NotificationDispatcher {
    config: EmailConfig,
    client: reqwest::Client,
}

impl NotificationDispatcher {
    /// Create a dispatcher with the given configuration.
    pub fn new(config: EmailConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// True when a delivery credential is configured.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Render a submission into a deliverable payload.
    pub fn compose(&self, msg: &ContactMessage<'_>) -> NotificationPayload {
        NotificationPayload {
            to: self.config.to_email.clone(),
            from: self.config.from_email.clone(),
            from_name: self.config.from_name.clone(),
            reply_to: msg.email.to_string(),
            subject_line: format!("{}: {}", self.config.subject_prefix, msg.subject),
            text_body: render_text(msg),
            html_body: render_html(&self.config.subject_prefix, msg),
        }
    }

    /// Deliver a submission.
    pub async fn dispatch(&self, msg: &ContactMessage<'_>) -> DispatchOutcome {
        let api_key = match &self.config.api_key {
            Some(key) => key,
            None => {
                warn!("Email delivery requested but no API key is configured");
                return DispatchOutcome::NotConfigured;
            }
        };

        let payload = self.compose(msg);
        let envelope = envelope(&payload);

        let response = self
            .client
            .post(&self.config.send_url)
            .bearer_auth(api_key)
            .json(&envelope)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!(to = %payload.to, "Contact notification delivered");
                DispatchOutcome::Sent
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let detail = resp.text().await.unwrap_or_default();
                warn!(status, detail = %detail, "Email provider rejected the message");
                DispatchOutcome::DeliveryFailed(DeliveryFailure::Rejected { status })
            }
            Err(err) => {
                warn!(error = %err, "Email provider unreachable");
                DispatchOutcome::DeliveryFailed(DeliveryFailure::Unreachable)
            }
        }
    }
}

/// SendGrid v3 mail/send envelope for a rendered payload.
fn envelope(payload: &NotificationPayload) -> serde_json::Value {
    json!({
        "personalizations": [
            {
                "to": [{ "email": payload.to }],
                "subject": payload.subject_line,
            }
        ],
        "from": { "email": payload.from, "name": payload.from_name },
        "reply_to": { "email": payload.reply_to },
        "content": [
            { "type": "text/plain", "value": payload.text_body },
            { "type": "text/html", "value": payload.html_body },
        ],
    })
}

/// Escape a value for embedding in the HTML body. Neutralizes
/// `& < > " '`; ampersand first so entities are not double-escaped.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Plain-text rendering: label:value lines, absent optional fields
/// omitted.
fn render_text(msg: &ContactMessage<'_>) -> String {
    let mut lines = vec!["New contact message".to_string(), String::new()];
    lines.push(format!("From: {}", msg.email));
    if let Some(company) = msg.company {
        lines.push(format!("Company: {}", company));
    }
    if let Some(phone) = msg.phone {
        lines.push(format!("Phone: {}", phone));
    }
    lines.push(format!("Subject: {}", msg.subject));
    lines.push(String::new());
    lines.push(msg.message.to_string());
    lines.join("\n")
}

fn meta_row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding:8px 0;opacity:0.8;width:120px;vertical-align:top;\">{}</td>\
         <td style=\"padding:8px 0;color:#fff;\">{}</td></tr>",
        label,
        escape_html(value)
    )
}

/// HTML rendering. Every user-supplied value passes through
/// [`escape_html`] before embedding.
fn render_html(subject_prefix: &str, msg: &ContactMessage<'_>) -> String {
    let mut meta_rows = String::new();
    meta_rows.push_str(&meta_row("From", msg.email));
    if let Some(company) = msg.company {
        meta_rows.push_str(&meta_row("Company", company));
    }
    if let Some(phone) = msg.phone {
        meta_rows.push_str(&meta_row("Phone", phone));
    }

    format!(
        "<!doctype html>\n\
<html><head><meta charset=\"utf-8\"></head><body style=\"margin:0;padding:24px;background:#0b0b0b;color:#fff;font-family:system-ui,-apple-system,Segoe UI,Roboto,Inter,Ubuntu,Arial,sans-serif;\">\n\
  <div style=\"max-width:640px;margin:0 auto;background:#101014;border:1px solid rgba(255,255,255,0.1);border-radius:16px;box-shadow:0 8px 24px rgba(0,0,0,0.35);\">\n\
    <div style=\"padding:20px 24px;border-bottom:1px solid rgba(255,255,255,0.08);\">\n\
      <h2 style=\"margin:0;font-size:18px;line-height:1.4;\">{prefix} &mdash; {subject}</h2>\n\
    </div>\n\
    <div style=\"padding:20px 24px;\">\n\
      <table style=\"width:100%;border-collapse:collapse;color:#d6d6d6;font-size:14px;\">{meta_rows}</table>\n\
      <div style=\"margin-top:16px;\">\n\
        <div style=\"font-size:12px;letter-spacing:0.06em;text-transform:uppercase;opacity:0.75;margin-bottom:8px;\">Message</div>\n\
        <div style=\"border:1px solid rgba(255,255,255,0.1);border-radius:12px;background:#0e0e12;padding:16px;color:#fff;\">\n\
          <pre style=\"margin:0;white-space:pre-wrap;word-wrap:break-word;font:inherit;\">{message}</pre>\n\
        </div>\n\
      </div>\n\
    </div>\n\
  </div>\n\
</body></html>",
        prefix = escape_html(subject_prefix),
        subject = escape_html(msg.subject),
        meta_rows = meta_rows,
        message = escape_html(msg.message),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ContactMessage<'static> {
        ContactMessage {
            email: "a@b.com",
            company: Some("Acme"),
            phone: None,
            subject: "Hi",
            message: "Test",
        }
    }

    fn dispatcher(api_key: Option<&str>) -> NotificationDispatcher {
        NotificationDispatcher::new(
            EmailConfig {
                api_key: api_key.map(String::from),
                ..Default::default()
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_escape_html_neutralizes_specials() {
        assert_eq!(
            escape_html("<script>&\"'"),
            "&lt;script&gt;&amp;&quot;&#39;"
        );
        // Ampersand escaped exactly once.
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_text_body_omits_absent_fields() {
        let text = render_text(&message());
        assert!(text.contains("From: a@b.com"));
        assert!(text.contains("Company: Acme"));
        assert!(!text.contains("Phone:"));
        assert!(text.ends_with("\nTest"));
    }

    #[test]
    fn test_html_body_escapes_user_input() {
        let msg = ContactMessage {
            email: "a@b.com",
            company: Some("Bad & Co"),
            phone: Some("123456"),
            subject: "<script>alert(1)</script>",
            message: "x < y && \"quoted\" 'single'",
        };
        let html = render_html("New contact", &msg);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Bad &amp; Co"));
        assert!(html.contains("&quot;quoted&quot;"));
        assert!(html.contains("&#39;single&#39;"));
    }

    #[test]
    fn test_subject_line_composition() {
        let payload = dispatcher(Some("key")).compose(&message());
        assert_eq!(payload.subject_line, "New contact: Hi");
        assert_eq!(payload.reply_to, "a@b.com");
        assert_eq!(payload.to, "hello@360ace.tech");
        assert_eq!(payload.from, "no-reply@360ace.tech");
    }

    #[test]
    fn test_envelope_shape() {
        let payload = dispatcher(Some("key")).compose(&message());
        let envelope = envelope(&payload);

        assert_eq!(
            envelope["personalizations"][0]["to"][0]["email"],
            "hello@360ace.tech"
        );
        assert_eq!(
            envelope["personalizations"][0]["subject"],
            "New contact: Hi"
        );
        assert_eq!(envelope["from"]["name"], "360ace.Tech Contact Form");
        assert_eq!(envelope["reply_to"]["email"], "a@b.com");
        assert_eq!(envelope["content"][0]["type"], "text/plain");
        assert_eq!(envelope["content"][1]["type"], "text/html");
    }

    #[tokio::test]
    async fn test_dispatch_without_key_reports_not_configured() {
        let outcome = dispatcher(None).dispatch(&message()).await;
        assert!(matches!(outcome, DispatchOutcome::NotConfigured));
    }

    #[test]
    fn test_masked_messages() {
        assert_eq!(
            DeliveryFailure::Rejected { status: 400 }.masked_message(),
            "Email failed"
        );
        assert_eq!(
            DeliveryFailure::Unreachable.masked_message(),
            "Email service unreachable."
        );
    }
}
