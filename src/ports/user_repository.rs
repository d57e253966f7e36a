//! Repository port for principals.

use async_trait::async_trait;

use crate::domain::auth::Principal;
use crate::domain::foundation::{DomainError, UserId};

/// Persistence contract for principals.
///
/// Mutations are whole-row updates; the single-slot reset-token invariant is
/// enforced by the `Principal` aggregate, not by the store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists a newly registered principal.
    async fn insert(&self, principal: &Principal) -> Result<(), DomainError>;

    /// Persists changes to an existing principal.
    async fn update(&self, principal: &Principal) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, DomainError>;

    /// Login lookup: exact match on email OR username, whichever hits.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Principal>, DomainError>;
}
