//! Email configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

/// Email configuration (HTTP delivery API)
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Delivery API endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Delivery API key
    pub api_key: SecretString,

    /// From address for outbound mail
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From display name
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl EmailConfig {
    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        Ok(())
    }
}

fn default_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_from_email() -> String {
    "noreply@codeshare-market.com".to_string()
}

fn default_from_name() -> String {
    "CodeShare Market".to_string()
}
