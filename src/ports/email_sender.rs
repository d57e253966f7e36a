//! Email collaborator port.
//!
//! The orchestrator hands over fully-formed content; transport internals stay
//! behind the adapter. Reset and verification mails surface synchronous
//! delivery failure to the caller; everything else is log-and-continue.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// A fully-formed outbound email.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Errors from the email transport.
#[derive(Debug, Clone, Error)]
pub enum EmailError {
    #[error("Email delivery failed: {0}")]
    Transport(String),
}

impl From<EmailError> for DomainError {
    fn from(err: EmailError) -> Self {
        DomainError::new(ErrorCode::EmailDeliveryFailed, err.to_string())
    }
}

/// Outbound email delivery.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}
