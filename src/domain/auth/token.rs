//! Signed, self-describing tokens for the four auth purposes.
//!
//! Tokens are HS256 JWTs carrying a subject, a purpose, and an expiry. The
//! signing secret is process-wide configuration handed in at construction;
//! rotating it invalidates every outstanding token, which is accepted and
//! documented behavior rather than a bug.
//!
//! A token is only trusted when its purpose matches the operation redeeming
//! it: an access token can never pass as a refresh token and vice versa.
//! Validation never panics on malformed input; every failure is a typed
//! `TokenError`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// The single operation a token may be redeemed for.
///
/// Purposes are non-interchangeable. The wire form matches the legacy `type`
/// claim values so previously issued tokens stay valid across deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    Refresh,
    PasswordReset,
    EmailVerification,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "access",
            TokenPurpose::Refresh => "refresh",
            TokenPurpose::PasswordReset => "password_reset",
            TokenPurpose::EmailVerification => "email_verification",
        }
    }
}

/// Claims encoded into every token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(rename = "type")]
    purpose: TokenPurpose,
    exp: i64,
    iat: i64,
}

/// Errors from token issue/validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Signature failure, garbage input, or missing claims.
    #[error("Invalid token")]
    Invalid,

    /// Structurally valid and correctly signed, but past expiry.
    #[error("Token expired")]
    Expired,

    /// Valid token presented to an operation with a different purpose.
    #[error("Invalid token type: expected {expected}")]
    WrongPurpose { expected: &'static str },
}

impl From<TokenError> for DomainError {
    fn from(err: TokenError) -> Self {
        DomainError::new(ErrorCode::InvalidToken, err.to_string())
    }
}

/// Time-to-live defaults for each purpose.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
    pub password_reset: Duration,
    pub email_verification: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: Duration::minutes(30),
            refresh: Duration::days(7),
            password_reset: Duration::hours(1),
            email_verification: Duration::hours(24),
        }
    }
}

/// Issues and validates purpose-bound tokens.
///
/// Issuing is a pure function of `(subject, purpose, ttl)` plus the signing
/// secret; no state is written. Some purposes are additionally back-checked
/// against stored state by their callers (password reset compares against the
/// token stored on the principal).
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttls: TokenTtls,
}

impl TokenService {
    /// Creates a token service with default TTLs.
    pub fn new(secret: &SecretString) -> Self {
        Self::with_ttls(secret, TokenTtls::default())
    }

    /// Creates a token service with explicit TTLs.
    pub fn with_ttls(secret: &SecretString, ttls: TokenTtls) -> Self {
        let secret_bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret_bytes),
            decoding_key: DecodingKey::from_secret(secret_bytes),
            ttls,
        }
    }

    /// Issues a token for `subject` redeemable only for `purpose`, expiring
    /// after `ttl`.
    pub fn issue(
        &self,
        subject: &str,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            purpose,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Invalid)
    }

    /// Access token for a principal id, default TTL.
    pub fn issue_access(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenPurpose::Access, self.ttls.access)
    }

    /// Refresh token for a principal id, default TTL.
    pub fn issue_refresh(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, TokenPurpose::Refresh, self.ttls.refresh)
    }

    /// Password-reset token for an email address, default TTL.
    pub fn issue_password_reset(&self, email: &str) -> Result<String, TokenError> {
        self.issue(email, TokenPurpose::PasswordReset, self.ttls.password_reset)
    }

    /// Email-verification token for an email address, default TTL.
    pub fn issue_email_verification(&self, email: &str) -> Result<String, TokenError> {
        self.issue(
            email,
            TokenPurpose::EmailVerification,
            self.ttls.email_verification,
        )
    }

    /// TTL configured for the password-reset purpose, for callers that store
    /// the matching expiry alongside the principal.
    pub fn password_reset_ttl(&self) -> Duration {
        self.ttls.password_reset
    }

    /// Validates a token and returns its subject.
    ///
    /// Fails when the signature does not verify, when the decoded purpose is
    /// not `expected_purpose`, or when the token has expired. A purpose
    /// mismatch is rejected even for otherwise well-formed, unexpired tokens.
    pub fn validate(
        &self,
        token: &str,
        expected_purpose: TokenPurpose,
    ) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.purpose != expected_purpose {
            return Err(TokenError::WrongPurpose {
                expected: expected_purpose.as_str(),
            });
        }

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::new("test-signing-secret".to_string()))
    }

    #[test]
    fn issued_token_validates_and_returns_subject() {
        let svc = service();
        let token = svc
            .issue("42", TokenPurpose::Access, Duration::minutes(30))
            .unwrap();

        let subject = svc.validate(&token, TokenPurpose::Access).unwrap();
        assert_eq!(subject, "42");
    }

    #[test]
    fn purpose_mismatch_fails_before_expiry() {
        let svc = service();
        let refresh = svc.issue_refresh("42").unwrap();

        let result = svc.validate(&refresh, TokenPurpose::Access);
        assert_eq!(
            result,
            Err(TokenError::WrongPurpose { expected: "access" })
        );
    }

    #[test]
    fn every_purpose_rejects_every_other_purpose() {
        let svc = service();
        let purposes = [
            TokenPurpose::Access,
            TokenPurpose::Refresh,
            TokenPurpose::PasswordReset,
            TokenPurpose::EmailVerification,
        ];

        for issued_as in purposes {
            let token = svc.issue("subject", issued_as, Duration::minutes(5)).unwrap();
            for expected in purposes {
                let result = svc.validate(&token, expected);
                if expected == issued_as {
                    assert!(result.is_ok());
                } else {
                    assert!(matches!(result, Err(TokenError::WrongPurpose { .. })));
                }
            }
        }
    }

    #[test]
    fn expired_token_fails_with_expiry() {
        let svc = service();
        let token = svc
            .issue("42", TokenPurpose::Access, Duration::seconds(-90))
            .unwrap();

        let result = svc.validate(&token, TokenPurpose::Access);
        assert_eq!(result, Err(TokenError::Expired));
    }

    #[test]
    fn malformed_input_fails_without_panicking() {
        let svc = service();
        for garbage in ["", "not-a-jwt", "a.b.c", "ey.ey.ey"] {
            let result = svc.validate(garbage, TokenPurpose::Access);
            assert_eq!(result, Err(TokenError::Invalid), "input: {:?}", garbage);
        }
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let svc = service();
        let other = TokenService::new(&SecretString::new("rotated-secret".to_string()));
        let token = other.issue_access("42").unwrap();

        assert_eq!(
            svc.validate(&token, TokenPurpose::Access),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn default_ttls_match_documented_windows() {
        let ttls = TokenTtls::default();
        assert_eq!(ttls.access, Duration::minutes(30));
        assert_eq!(ttls.refresh, Duration::days(7));
        assert_eq!(ttls.password_reset, Duration::hours(1));
        assert_eq!(ttls.email_verification, Duration::hours(24));
    }

    #[test]
    fn wire_purpose_uses_legacy_type_claim_values() {
        assert_eq!(TokenPurpose::PasswordReset.as_str(), "password_reset");
        assert_eq!(
            serde_json::to_string(&TokenPurpose::EmailVerification).unwrap(),
            "\"email_verification\""
        );
    }
}
