//! Session / identity resolution.
//!
//! Turns a bearer token into an authenticated, authorized principal and
//! enforces the active/banned/role gates. Every mutating operation in the
//! system goes through here first.

use std::sync::Arc;

use crate::domain::auth::{Principal, TokenPurpose, TokenService};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::UserRepository;

/// Resolves bearer tokens to principals.
pub struct IdentityResolver {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserRepository>) -> Self {
        Self { tokens, users }
    }

    /// Validates a bearer token as `Access` purpose and loads the principal.
    ///
    /// A bad token and an absent principal both fail `Unauthenticated`; the
    /// caller cannot tell which.
    pub async fn authenticate(&self, bearer_token: &str) -> Result<Principal, DomainError> {
        let subject = self
            .tokens
            .validate(bearer_token, TokenPurpose::Access)
            .map_err(|_| DomainError::unauthenticated())?;

        let user_id = UserId::parse(&subject).ok_or_else(DomainError::unauthenticated)?;

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(DomainError::unauthenticated)
    }

    /// Enforces the account gates: inactive is checked first, then banned.
    pub fn authorize_active(&self, principal: Principal) -> Result<Principal, DomainError> {
        if !principal.is_active {
            return Err(DomainError::new(ErrorCode::AccountInactive, "Inactive user"));
        }
        if principal.is_banned {
            return Err(DomainError::new(
                ErrorCode::AccountBanned,
                "User account is banned",
            ));
        }
        Ok(principal)
    }

    /// Seller gate; admin satisfies it.
    pub fn authorize_seller(&self, principal: Principal) -> Result<Principal, DomainError> {
        if !principal.role.can_sell() {
            return Err(DomainError::forbidden("Seller permissions required"));
        }
        Ok(principal)
    }

    /// Admin gate.
    pub fn authorize_admin(&self, principal: Principal) -> Result<Principal, DomainError> {
        if !principal.role.is_admin() {
            return Err(DomainError::forbidden("Not enough permissions"));
        }
        Ok(principal)
    }

    /// Full resolution for protected routes: authenticate, then account gates.
    pub async fn resolve_active(&self, bearer_token: &str) -> Result<Principal, DomainError> {
        let principal = self.authenticate(bearer_token).await?;
        self.authorize_active(principal)
    }
}
