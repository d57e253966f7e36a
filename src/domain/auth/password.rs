//! Password hashing and verification.
//!
//! bcrypt with per-hash salting. `hash` and `verify` are the only two entry
//! points; raw password material never persists beyond the call stack.
//! Hashing is deliberately slow, so callers on an event loop should run it on
//! a blocking thread (`tokio::task::spawn_blocking`).

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::domain::foundation::{DomainError, ErrorCode};

/// A stored bcrypt password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes a plaintext password at the default cost.
    pub fn from_plain(plain: &str) -> Result<Self, DomainError> {
        Self::from_plain_with_cost(plain, DEFAULT_COST)
    }

    /// Hashes at an explicit cost. Lower costs are for tests only.
    pub fn from_plain_with_cost(plain: &str, cost: u32) -> Result<Self, DomainError> {
        hash(plain, cost)
            .map(Self)
            .map_err(|e| DomainError::new(ErrorCode::InternalError, format!("Hashing failed: {}", e)))
    }

    /// Wraps an already-hashed value loaded from storage.
    pub fn from_stored(hashed: impl Into<String>) -> Self {
        Self(hashed.into())
    }

    /// Verifies a plaintext password against this hash.
    ///
    /// A malformed stored hash verifies as false rather than erroring, so a
    /// corrupt row degrades to a failed login instead of a server fault.
    pub fn verify(&self, plain: &str) -> bool {
        verify(plain, &self.0).unwrap_or(false)
    }

    /// The stored string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
