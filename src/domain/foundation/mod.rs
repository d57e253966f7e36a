//! Foundation module - shared domain primitives.
//!
//! Identifiers, roles, error types, and the state-machine trait that form the
//! vocabulary of the marketplace domain.

mod errors;
mod ids;
mod role;
mod state_machine;

pub use errors::{DomainError, ErrorCode};
pub use ids::{ProductId, TransactionId, UserId};
pub use role::UserRole;
pub use state_machine::StateMachine;
