//! Authentication configuration

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::auth::TokenTtls;

/// Authentication configuration (token signing and lifetimes)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret for all token purposes. Rotating it invalidates
    /// every outstanding token.
    pub jwt_secret: SecretString,

    /// Access token lifetime in minutes
    #[serde(default = "default_access_ttl_minutes")]
    pub access_token_ttl_minutes: i64,

    /// Refresh token lifetime in days
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_token_ttl_days: i64,

    /// Password-reset token lifetime in hours
    #[serde(default = "default_reset_ttl_hours")]
    pub reset_token_ttl_hours: i64,

    /// Email-verification token lifetime in hours
    #[serde(default = "default_verification_ttl_hours")]
    pub verification_token_ttl_hours: i64,

    /// Frontend base URL, used to build reset/verification links
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl AuthConfig {
    /// Token TTLs as durations for the token service.
    pub fn token_ttls(&self) -> TokenTtls {
        TokenTtls {
            access: Duration::minutes(self.access_token_ttl_minutes),
            refresh: Duration::days(self.refresh_token_ttl_days),
            password_reset: Duration::hours(self.reset_token_ttl_hours),
            email_verification: Duration::hours(self.verification_token_ttl_hours),
        }
    }

    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.jwt_secret.expose_secret().len() < 32 {
            return Err(ValidationError::JwtSecretTooShort);
        }
        if self.access_token_ttl_minutes <= 0
            || self.refresh_token_ttl_days <= 0
            || self.reset_token_ttl_hours <= 0
            || self.verification_token_ttl_hours <= 0
        {
            return Err(ValidationError::InvalidTokenTtl);
        }
        if !self.frontend_url.starts_with("http://") && !self.frontend_url.starts_with("https://") {
            return Err(ValidationError::InvalidFrontendUrl);
        }
        Ok(())
    }
}

fn default_access_ttl_minutes() -> i64 {
    30
}

fn default_refresh_ttl_days() -> i64 {
    7
}

fn default_reset_ttl_hours() -> i64 {
    1
}

fn default_verification_ttl_hours() -> i64 {
    24
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AuthConfig {
        AuthConfig {
            jwt_secret: SecretString::new("0123456789abcdef0123456789abcdef".to_string()),
            access_token_ttl_minutes: default_access_ttl_minutes(),
            refresh_token_ttl_days: default_refresh_ttl_days(),
            reset_token_ttl_hours: default_reset_ttl_hours(),
            verification_token_ttl_hours: default_verification_ttl_hours(),
            frontend_url: default_frontend_url(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn short_secret_is_rejected() {
        let config = AuthConfig {
            jwt_secret: SecretString::new("short".to_string()),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_ttls_are_rejected() {
        let config = AuthConfig {
            access_token_ttl_minutes: 0,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn ttls_convert_to_documented_durations() {
        let ttls = valid().token_ttls();
        assert_eq!(ttls.access, Duration::minutes(30));
        assert_eq!(ttls.refresh, Duration::days(7));
        assert_eq!(ttls.password_reset, Duration::hours(1));
        assert_eq!(ttls.email_verification, Duration::hours(24));
    }

    #[test]
    fn frontend_url_must_be_http() {
        let config = AuthConfig {
            frontend_url: "ftp://example.com".to_string(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }
}
