//! Mail transports.
//!
//! - `ResendTransport` delivers through the Resend HTTP API
//! - `LogTransport` only logs, for dry runs and unconfigured environments
//!
//! Transports never retry: a failed send surfaces as `AppError::Mail` and the
//! dispatcher records the recipient as failed.

use async_trait::async_trait;
use serde::Serialize;

use campaign_common::error::{AppError, AppResult};
use campaign_common::types::Mail;
use campaign_engine::providers::MailTransport;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Request body of `POST /emails`.
#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    bcc: Option<[&'a str; 1]>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct ResendTransport {
    http_client: reqwest::Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl ResendTransport {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }

    /// Point the transport at a different API base (e.g. a local mock).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn body<'a>(&'a self, mail: &'a Mail) -> ResendEmail<'a> {
        ResendEmail {
            from: &self.from,
            to: [mail.to.as_str()],
            bcc: mail.bcc.as_deref().map(|bcc| [bcc]),
            subject: &mail.subject,
            html: &mail.content,
        }
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    async fn send(&self, mail: &Mail) -> AppResult<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.body(mail))
            .send()
            .await
            .map_err(|e| AppError::Mail(format!("Resend request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Mail(format!(
                "Resend returned {}: {}",
                status, error_text
            )));
        }

        tracing::debug!(to = %mail.to, status = status.as_u16(), "Mail accepted by Resend");
        Ok(())
    }
}

/// Logs mails instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, mail: &Mail) -> AppResult<()> {
        tracing::info!(
            to = %mail.to,
            bcc = mail.bcc.as_deref().unwrap_or(""),
            subject = %mail.subject,
            content_bytes = mail.content.len(),
            "Would send mail (dry run)"
        );
        Ok(())
    }
}
