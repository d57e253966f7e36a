//! Auth domain: principals, password hashing, and purpose-bound tokens.

mod password;
mod principal;
mod token;

pub use password::PasswordHash;
pub use principal::{Principal, DEFAULT_COMMISSION_RATE};
pub use token::{TokenError, TokenPurpose, TokenService, TokenTtls};
