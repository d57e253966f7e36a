//! Router for the auth endpoints.
//!
//! - `POST /register` - Create an account
//! - `POST /login` - Exchange credentials for a token pair
//! - `POST /refresh` - Exchange a refresh token for a new access token
//! - `POST /logout` - Acknowledge logout (requires auth)
//! - `GET /me` - Current principal (requires auth)
//! - `POST /password-reset` - Request a reset email
//! - `POST /password-reset/confirm` - Redeem a reset token
//! - `POST /verify-email` - Redeem a verification token

use axum::routing::{get, post};
use axum::Router;

use super::super::AppState;
use super::handlers;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route("/password-reset", post(handlers::request_password_reset))
        .route(
            "/password-reset/confirm",
            post(handlers::confirm_password_reset),
        )
        .route("/verify-email", post(handlers::verify_email))
}
