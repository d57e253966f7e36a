//! Request/response DTOs for the auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::auth::Principal;
use crate::domain::foundation::UserRole;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    /// Email address or username.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequestBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmBody {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailBody {
    pub token: String,
}

/// Public view of a principal. Never includes the password hash or the
/// stored reset token.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub role: UserRole,
    pub commission_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&Principal> for UserResponse {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id.as_uuid(),
            email: p.email.clone(),
            username: p.username.clone(),
            full_name: p.full_name.clone(),
            is_active: p.is_active,
            is_verified: p.is_verified,
            role: p.role,
            commission_rate: p.commission_rate,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
