//! Error types for the domain layer.
//!
//! Every expected, user-facing failure in the auth and transaction flows is a
//! `DomainError` carrying a stable `ErrorCode`. Callers (the HTTP layer in
//! particular) map codes to transport status; the code strings themselves are
//! the client-visible contract and must not change.

use std::error::Error;
use std::fmt;

/// Stable error codes for client-visible failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Credential / token errors
    InvalidCredentials,
    Unauthenticated,
    InvalidToken,
    InvalidOrExpiredToken,

    // Account state errors
    AccountInactive,
    AccountBanned,
    Forbidden,
    AlreadyVerified,
    EmailTaken,
    UsernameTaken,

    // Not found errors
    UserNotFound,
    ProductNotFound,
    TransactionNotFound,

    // Transaction state errors
    InvalidStateTransition,
    DownloadLimitReached,

    // Collaborator errors
    GatewayError,
    EmailDeliveryFailed,

    // Infrastructure errors
    DatabaseError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            ErrorCode::AccountInactive => "ACCOUNT_INACTIVE",
            ErrorCode::AccountBanned => "ACCOUNT_BANNED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::AlreadyVerified => "ALREADY_VERIFIED",
            ErrorCode::EmailTaken => "EMAIL_TAKEN",
            ErrorCode::UsernameTaken => "USERNAME_TAKEN",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::ProductNotFound => "PRODUCT_NOT_FOUND",
            ErrorCode::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::DownloadLimitReached => "DOWNLOAD_LIMIT_REACHED",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::EmailDeliveryFailed => "EMAIL_DELIVERY_FAILED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    code: ErrorCode,
    message: String,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The stable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Uniform failure for a bad login, whether the identifier was unknown or
    /// the password was wrong. The two cases must stay indistinguishable.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Incorrect username or password")
    }

    /// Missing, malformed, or expired access token.
    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "Could not validate credentials")
    }

    /// Reset/verification token failure, covering wrong purpose, stale stored
    /// token, and past expiry alike.
    pub fn invalid_or_expired_token() -> Self {
        Self::new(ErrorCode::InvalidOrExpiredToken, "Invalid or expired token")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn product_not_found(id: impl fmt::Display) -> Self {
        Self::new(ErrorCode::ProductNotFound, format!("Product not found: {}", id))
    }

    pub fn transaction_not_found(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::TransactionNotFound,
            format!("Transaction not found: {}", id),
        )
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GatewayError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}
