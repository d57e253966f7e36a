//! Outbound email over an HTTP delivery API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::debug;

use crate::config::EmailConfig;
use crate::ports::{EmailError, EmailMessage, EmailSender};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendPayload<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

/// Email sender backed by a Resend-compatible HTTP API.
pub struct HttpEmailSender {
    client: reqwest::Client,
    config: EmailConfig,
}

impl HttpEmailSender {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| EmailError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let payload = SendPayload {
            from: format!("{} <{}>", self.config.from_name, self.config.from_email),
            to: [message.to.as_str()],
            subject: &message.subject,
            text: &message.body_text,
            html: message.body_html.as_deref(),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmailError::Transport(format!(
                "delivery API returned {}",
                response.status()
            )));
        }
        debug!(to = %message.to, "email accepted for delivery");
        Ok(())
    }
}
