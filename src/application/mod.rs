//! Application services: flow orchestration over the domain and ports.

pub mod auth_service;
pub mod identity;
pub mod transaction_service;

pub use auth_service::{AuthService, RegisterRequest, TokenPair};
pub use identity::IdentityResolver;
pub use transaction_service::{CheckoutRedirect, TransactionService};
