//! The Principal entity - an authenticated marketplace user.
//!
//! Principals are created at registration and mutated only through the auth
//! flows and admin actions. They are never hard-deleted; `is_active` and
//! `is_banned` are the soft states.

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

use super::password::PasswordHash;
use crate::domain::foundation::{DomainError, ErrorCode, UserId, UserRole};

/// Default commission rate applied to new sellers (20%).
pub const DEFAULT_COMMISSION_RATE: f64 = 0.20;

/// An identity in the marketplace: buyer, seller, admin, or moderator.
///
/// Invariant: at most one outstanding password-reset token exists per
/// principal. Issuing a new one overwrites the previous one, which is what
/// makes reset tokens effectively single-use.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub password_hash: PasswordHash,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_banned: bool,
    pub role: UserRole,
    pub commission_rate: f64,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// Creates a fresh principal at registration time.
    ///
    /// New accounts start active, unverified, unbanned, in the buyer role,
    /// with the default commission rate.
    pub fn register(
        email: impl Into<String>,
        username: impl Into<String>,
        full_name: Option<String>,
        password_hash: PasswordHash,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::generate(),
            email: email.into(),
            username: username.into(),
            full_name,
            password_hash,
            is_active: true,
            is_verified: false,
            is_banned: false,
            role: UserRole::default(),
            commission_rate: DEFAULT_COMMISSION_RATE,
            password_reset_token: None,
            password_reset_expires: None,
            email_verified_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stores a newly issued reset token, replacing any outstanding one.
    pub fn store_reset_token(&mut self, token: String, expires: DateTime<Utc>, now: DateTime<Utc>) {
        self.password_reset_token = Some(token);
        self.password_reset_expires = Some(expires);
        self.updated_at = now;
    }

    /// True only when `presented` equals the stored reset token and the stored
    /// expiry has not passed. Comparison is constant-time.
    pub fn reset_token_matches(&self, presented: &str, now: DateTime<Utc>) -> bool {
        let stored = match (&self.password_reset_token, self.password_reset_expires) {
            (Some(token), Some(expires)) if expires > now => token,
            _ => return false,
        };
        stored.as_bytes().ct_eq(presented.as_bytes()).into()
    }

    /// Applies a confirmed password reset: new hash in, stored token cleared.
    pub fn complete_password_reset(&mut self, new_hash: PasswordHash, now: DateTime<Utc>) {
        self.password_hash = new_hash;
        self.password_reset_token = None;
        self.password_reset_expires = None;
        self.updated_at = now;
    }

    /// Marks the email verified; fails if it already was.
    pub fn mark_email_verified(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.is_verified {
            return Err(DomainError::new(
                ErrorCode::AlreadyVerified,
                "Email already verified",
            ));
        }
        self.is_verified = true;
        self.email_verified_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Records a successful login.
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn principal() -> Principal {
        Principal::register(
            "alice@example.com",
            "alice",
            Some("Alice".to_string()),
            PasswordHash::from_stored("$2b$04$fixture"),
            Utc::now(),
        )
    }

    #[test]
    fn registration_defaults() {
        let p = principal();
        assert!(p.is_active);
        assert!(!p.is_verified);
        assert!(!p.is_banned);
        assert_eq!(p.role, UserRole::Buyer);
        assert_eq!(p.commission_rate, DEFAULT_COMMISSION_RATE);
        assert!(p.password_reset_token.is_none());
    }

    #[test]
    fn storing_a_reset_token_overwrites_the_previous_one() {
        let mut p = principal();
        let now = Utc::now();
        p.store_reset_token("first".to_string(), now + Duration::hours(1), now);
        p.store_reset_token("second".to_string(), now + Duration::hours(1), now);

        assert!(!p.reset_token_matches("first", now));
        assert!(p.reset_token_matches("second", now));
    }

    #[test]
    fn reset_token_does_not_match_after_expiry() {
        let mut p = principal();
        let now = Utc::now();
        p.store_reset_token("token".to_string(), now + Duration::hours(1), now);

        assert!(p.reset_token_matches("token", now));
        assert!(!p.reset_token_matches("token", now + Duration::hours(2)));
    }

    #[test]
    fn completing_a_reset_clears_the_stored_token() {
        let mut p = principal();
        let now = Utc::now();
        p.store_reset_token("token".to_string(), now + Duration::hours(1), now);
        p.complete_password_reset(PasswordHash::from_stored("$2b$04$new"), now);

        assert!(p.password_reset_token.is_none());
        assert!(p.password_reset_expires.is_none());
        assert!(!p.reset_token_matches("token", now));
    }

    #[test]
    fn email_verification_is_one_shot() {
        let mut p = principal();
        let now = Utc::now();
        assert!(p.mark_email_verified(now).is_ok());
        assert!(p.is_verified);
        assert_eq!(p.email_verified_at, Some(now));

        let second = p.mark_email_verified(now);
        assert_eq!(second.unwrap_err().code(), ErrorCode::AlreadyVerified);
    }

    #[test]
    fn record_login_sets_timestamp() {
        let mut p = principal();
        assert!(p.last_login_at.is_none());
        let now = Utc::now();
        p.record_login(now);
        assert_eq!(p.last_login_at, Some(now));
    }
}
