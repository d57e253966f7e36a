//! Bearer authentication middleware and extractors.
//!
//! The middleware validates `Authorization: Bearer <token>` through the
//! identity resolver and injects the resolved `Principal` into request
//! extensions. Requests without a token pass through unauthenticated;
//! handlers opt in to enforcement with the extractors below.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::IdentityResolver;
use crate::domain::auth::Principal;
use crate::domain::foundation::DomainError;

/// Validates the bearer token, if any, and stores the principal.
///
/// Account gates run here too: an inactive or banned principal is rejected
/// before any handler sees the request.
pub async fn auth_middleware(
    State(identity): State<Arc<IdentityResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) => match identity.resolve_active(token).await {
            Ok(principal) => {
                request.extensions_mut().insert(principal);
                next.run(request).await
            }
            Err(err) => err.into_response(),
        },
        None => next.run(request).await,
    }
}

/// Extractor requiring an authenticated, active principal.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(DomainError::unauthenticated)
    }
}

/// Extractor requiring a principal allowed to sell. Admin passes the gate.
#[derive(Debug, Clone)]
pub struct RequireSeller(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireSeller
where
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(DomainError::unauthenticated)?;
        if !principal.role.can_sell() {
            return Err(DomainError::forbidden("Seller permissions required"));
        }
        Ok(RequireSeller(principal))
    }
}

/// Extractor requiring an admin principal.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(DomainError::unauthenticated)?;
        if !principal.role.is_admin() {
            return Err(DomainError::forbidden("Not enough permissions"));
        }
        Ok(RequireAdmin(principal))
    }
}
