//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, roles, errors, state machine)
//! - `auth` - Principals, password hashing, purpose-bound tokens
//! - `transaction` - Purchase aggregate and its status lifecycle

pub mod auth;
pub mod foundation;
pub mod transaction;
