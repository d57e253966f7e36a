//! Auth flows: register, login, refresh, logout, password reset, email
//! verification.
//!
//! The service owns flow orchestration only; credential rules live on the
//! domain types and persistence behind the ports. bcrypt work is pushed onto
//! blocking threads so the event loop never stalls on a hash.

use std::sync::Arc;

use bcrypt::DEFAULT_COST;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::auth::{PasswordHash, Principal, TokenPurpose, TokenService};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{EmailMessage, EmailSender, UserRepository};

/// The access/refresh pair returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl TokenPair {
    fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer",
        }
    }
}

/// Input for registration.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Orchestrates the account lifecycle flows.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    email: Arc<dyn EmailSender>,
    frontend_url: String,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        email: Arc<dyn EmailSender>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            tokens,
            email,
            frontend_url: frontend_url.into(),
            bcrypt_cost: DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt cost. Tests use the minimum cost.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Registers a new account and sends the verification email.
    ///
    /// Email and username are each checked for uniqueness before the insert;
    /// the email check wins when both collide.
    pub async fn register(&self, request: RegisterRequest) -> Result<Principal, DomainError> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(DomainError::new(
                ErrorCode::EmailTaken,
                "Email already registered",
            ));
        }
        if self
            .users
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(DomainError::new(
                ErrorCode::UsernameTaken,
                "Username already taken",
            ));
        }

        let hash = self.hash_password(request.password).await?;
        let principal = Principal::register(
            request.email,
            request.username,
            request.full_name,
            hash,
            Utc::now(),
        );
        self.users.insert(&principal).await?;
        info!(user_id = %principal.id, "registered new account");

        let token = self.tokens.issue_email_verification(&principal.email)?;
        self.send_verification_email(&principal, &token).await?;

        Ok(principal)
    }

    /// Authenticates by email or username plus password and issues a token
    /// pair. Every credential failure is the same `INVALID_CREDENTIALS`.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<TokenPair, DomainError> {
        let mut principal = self
            .users
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(DomainError::invalid_credentials)?;

        if !self.verify_password(password, &principal.password_hash).await? {
            return Err(DomainError::invalid_credentials());
        }
        if !principal.is_active {
            return Err(DomainError::new(ErrorCode::AccountInactive, "Inactive user"));
        }
        if principal.is_banned {
            return Err(DomainError::new(
                ErrorCode::AccountBanned,
                "User account is banned",
            ));
        }

        let subject = principal.id.to_string();
        let access = self.tokens.issue_access(&subject)?;
        let refresh = self.tokens.issue_refresh(&subject)?;

        principal.record_login(Utc::now());
        self.users.update(&principal).await?;
        info!(user_id = %principal.id, "login succeeded");

        Ok(TokenPair::bearer(access, refresh))
    }

    /// Exchanges a refresh token for a fresh access token.
    ///
    /// The presented refresh token is echoed back unchanged; there is no
    /// rotation, so it stays valid until its own expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let subject = self
            .tokens
            .validate(refresh_token, TokenPurpose::Refresh)?;
        let user_id = UserId::parse(&subject)
            .ok_or_else(|| DomainError::new(ErrorCode::InvalidToken, "Invalid token"))?;

        let principal = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(DomainError::unauthenticated)?;
        if !principal.is_active {
            return Err(DomainError::new(ErrorCode::AccountInactive, "Inactive user"));
        }

        let access = self.tokens.issue_access(&subject)?;
        Ok(TokenPair::bearer(access, refresh_token.to_string()))
    }

    /// Logout acknowledgement. Tokens are stateless, so nothing is revoked;
    /// clients discard their copies.
    pub fn logout(&self, principal: &Principal) {
        info!(user_id = %principal.id, "logout acknowledged");
    }

    /// Starts a password reset for `email`.
    ///
    /// Always returns success for unknown addresses so the endpoint cannot be
    /// used to enumerate accounts. For known addresses the issued token
    /// overwrites any outstanding one.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let Some(mut principal) = self.users.find_by_email(email).await? else {
            warn!("password reset requested for unknown email");
            return Ok(());
        };

        let token = self.tokens.issue_password_reset(&principal.email)?;
        let now = Utc::now();
        let expires = now + self.tokens.password_reset_ttl();
        principal.store_reset_token(token.clone(), expires, now);
        self.users.update(&principal).await?;

        let reset_url = format!("{}/reset-password?token={}", self.frontend_url, token);
        self.email
            .send(EmailMessage {
                to: principal.email.clone(),
                subject: "Reset your password".to_string(),
                body_text: format!(
                    "A password reset was requested for your account.\n\n\
                     Reset it here (link expires in 1 hour): {}\n\n\
                     If you did not request this, ignore this email.",
                    reset_url
                ),
                body_html: Some(format!(
                    "<p>A password reset was requested for your account.</p>\
                     <p><a href=\"{}\">Reset your password</a> (link expires in 1 hour).</p>\
                     <p>If you did not request this, ignore this email.</p>",
                    reset_url
                )),
            })
            .await?;
        info!(user_id = %principal.id, "password reset email sent");
        Ok(())
    }

    /// Completes a password reset.
    ///
    /// Three checks in order: the token validates as `PasswordReset`, it
    /// matches the stored single-use slot, and the stored expiry has not
    /// passed. Any failure is the same `INVALID_OR_EXPIRED_TOKEN`.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: String,
    ) -> Result<(), DomainError> {
        let email = self
            .tokens
            .validate(token, TokenPurpose::PasswordReset)
            .map_err(|_| DomainError::invalid_or_expired_token())?;

        let mut principal = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(DomainError::invalid_or_expired_token)?;

        let now = Utc::now();
        if !principal.reset_token_matches(token, now) {
            return Err(DomainError::invalid_or_expired_token());
        }

        let hash = self.hash_password(new_password).await?;
        principal.complete_password_reset(hash, now);
        self.users.update(&principal).await?;
        info!(user_id = %principal.id, "password reset completed");
        Ok(())
    }

    /// Redeems an email-verification token.
    pub async fn verify_email(&self, token: &str) -> Result<Principal, DomainError> {
        let email = self
            .tokens
            .validate(token, TokenPurpose::EmailVerification)
            .map_err(|_| DomainError::invalid_or_expired_token())?;

        let mut principal = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(DomainError::invalid_or_expired_token)?;

        principal.mark_email_verified(Utc::now())?;
        self.users.update(&principal).await?;
        info!(user_id = %principal.id, "email verified");
        Ok(principal)
    }

    async fn send_verification_email(
        &self,
        principal: &Principal,
        token: &str,
    ) -> Result<(), DomainError> {
        let verify_url = format!("{}/verify-email?token={}", self.frontend_url, token);
        self.email
            .send(EmailMessage {
                to: principal.email.clone(),
                subject: "Verify your email address".to_string(),
                body_text: format!(
                    "Welcome! Confirm your email address to finish setting up \
                     your account (link expires in 24 hours): {}",
                    verify_url
                ),
                body_html: Some(format!(
                    "<p>Welcome! Confirm your email address to finish setting up \
                     your account.</p>\
                     <p><a href=\"{}\">Verify email</a> (link expires in 24 hours).</p>",
                    verify_url
                )),
            })
            .await?;
        Ok(())
    }

    async fn hash_password(&self, plain: String) -> Result<PasswordHash, DomainError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || PasswordHash::from_plain_with_cost(&plain, cost))
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::InternalError, format!("Hashing task failed: {}", e))
            })?
    }

    async fn verify_password(
        &self,
        plain: &str,
        hash: &PasswordHash,
    ) -> Result<bool, DomainError> {
        let plain = plain.to_string();
        let hash = hash.clone();
        tokio::task::spawn_blocking(move || hash.verify(&plain))
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Verification task failed: {}", e),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryUserRepository, RecordingEmailSender};
    use secrecy::SecretString;

    const TEST_COST: u32 = 4;

    struct Fixture {
        service: AuthService,
        users: Arc<InMemoryUserRepository>,
        outbox: Arc<RecordingEmailSender>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let outbox = Arc::new(RecordingEmailSender::new());
        let tokens = Arc::new(TokenService::new(&SecretString::new(
            "auth-service-test-secret".to_string(),
        )));
        let service = AuthService::new(
            users.clone(),
            tokens,
            outbox.clone(),
            "http://localhost:3000",
        )
        .with_bcrypt_cost(TEST_COST);
        Fixture {
            service,
            users,
            outbox,
        }
    }

    fn register_request(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: "correct horse battery staple".to_string(),
            full_name: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_by_email_and_username() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();

        let by_email = fx
            .service
            .login("alice@example.com", "correct horse battery staple")
            .await
            .unwrap();
        assert_eq!(by_email.token_type, "bearer");

        let by_username = fx
            .service
            .login("alice", "correct horse battery staple")
            .await
            .unwrap();
        assert!(!by_username.access_token.is_empty());
    }

    #[tokio::test]
    async fn registration_sends_a_verification_email() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();

        let sent = fx.outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert!(sent[0].body_text.contains("/verify-email?token="));
    }

    #[tokio::test]
    async fn duplicate_email_and_username_are_rejected_separately() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();

        let email_clash = fx
            .service
            .register(register_request("alice@example.com", "alice2"))
            .await
            .unwrap_err();
        assert_eq!(email_clash.code(), ErrorCode::EmailTaken);

        let username_clash = fx
            .service
            .register(register_request("alice2@example.com", "alice"))
            .await
            .unwrap_err();
        assert_eq!(username_clash.code(), ErrorCode::UsernameTaken);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_identifier_fail_identically() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();

        let wrong_password = fx
            .service
            .login("alice@example.com", "nope")
            .await
            .unwrap_err();
        let unknown_user = fx.service.login("nobody@example.com", "nope").await.unwrap_err();
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.code(), ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn banned_account_cannot_login_even_with_valid_password() {
        let fx = fixture();
        let principal = fx
            .service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();
        let mut banned = principal.clone();
        banned.is_banned = true;
        fx.users.update(&banned).await.unwrap();

        let err = fx
            .service
            .login("alice@example.com", "correct horse battery staple")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountBanned);
    }

    #[tokio::test]
    async fn refresh_issues_new_access_and_echoes_refresh_token() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();
        let pair = fx
            .service
            .login("alice@example.com", "correct horse battery staple")
            .await
            .unwrap();

        let refreshed = fx.service.refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(refreshed.refresh_token, pair.refresh_token);
        assert!(!refreshed.access_token.is_empty());
    }

    #[tokio::test]
    async fn access_token_cannot_be_used_to_refresh() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();
        let pair = fx
            .service
            .login("alice@example.com", "correct horse battery staple")
            .await
            .unwrap();

        let err = fx.service.refresh(&pair.access_token).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidToken);
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email_succeeds_and_sends_nothing() {
        let fx = fixture();
        fx.service
            .request_password_reset("nobody@example.com")
            .await
            .unwrap();
        assert!(fx.outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn full_password_reset_flow_changes_the_password() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();
        fx.outbox.clear();

        fx.service
            .request_password_reset("alice@example.com")
            .await
            .unwrap();
        let sent = fx.outbox.sent();
        assert_eq!(sent.len(), 1);
        let token = sent[0]
            .body_text
            .split("token=")
            .nth(1)
            .unwrap()
            .split_whitespace()
            .next()
            .unwrap()
            .to_string();

        fx.service
            .confirm_password_reset(&token, "a brand new password".to_string())
            .await
            .unwrap();

        assert!(fx
            .service
            .login("alice@example.com", "correct horse battery staple")
            .await
            .is_err());
        assert!(fx
            .service
            .login("alice@example.com", "a brand new password")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn reset_token_is_single_use() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();
        fx.outbox.clear();
        fx.service
            .request_password_reset("alice@example.com")
            .await
            .unwrap();
        let token = fx.outbox.sent()[0]
            .body_text
            .split("token=")
            .nth(1)
            .unwrap()
            .split_whitespace()
            .next()
            .unwrap()
            .to_string();

        fx.service
            .confirm_password_reset(&token, "first new password".to_string())
            .await
            .unwrap();
        let replay = fx
            .service
            .confirm_password_reset(&token, "second new password".to_string())
            .await
            .unwrap_err();
        assert_eq!(replay.code(), ErrorCode::InvalidOrExpiredToken);
    }

    #[tokio::test]
    async fn newer_reset_request_invalidates_the_older_token() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();
        fx.outbox.clear();

        fx.service
            .request_password_reset("alice@example.com")
            .await
            .unwrap();
        // Token payloads are second-granular; force distinct signatures by
        // requesting against a distinct stored slot instead of the clock.
        let first_token = fx.outbox.sent()[0]
            .body_text
            .split("token=")
            .nth(1)
            .unwrap()
            .split_whitespace()
            .next()
            .unwrap()
            .to_string();

        let mut principal = fx
            .users
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        principal.store_reset_token("different".to_string(), Utc::now() + chrono::Duration::hours(1), Utc::now());
        fx.users.update(&principal).await.unwrap();

        let err = fx
            .service
            .confirm_password_reset(&first_token, "new password".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidOrExpiredToken);
    }

    #[tokio::test]
    async fn email_verification_is_one_shot() {
        let fx = fixture();
        fx.service
            .register(register_request("alice@example.com", "alice"))
            .await
            .unwrap();
        let token = fx.outbox.sent()[0]
            .body_text
            .split("token=")
            .nth(1)
            .unwrap()
            .split_whitespace()
            .next()
            .unwrap()
            .to_string();

        let verified = fx.service.verify_email(&token).await.unwrap();
        assert!(verified.is_verified);

        let again = fx.service.verify_email(&token).await.unwrap_err();
        assert_eq!(again.code(), ErrorCode::AlreadyVerified);
    }

    #[tokio::test]
    async fn garbage_verification_token_is_rejected() {
        let fx = fixture();
        let err = fx.service.verify_email("not-a-token").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidOrExpiredToken);
    }
}
