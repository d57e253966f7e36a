//! HTTP handlers for the auth endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::RegisterRequest;
use crate::domain::foundation::DomainError;

use super::super::middleware::CurrentUser;
use super::super::AppState;
use super::dto::{
    LoginBody, MessageResponse, PasswordResetConfirmBody, PasswordResetRequestBody, RefreshBody,
    RegisterBody, UserResponse, VerifyEmailBody,
};

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, DomainError> {
    let principal = state
        .auth
        .register(RegisterRequest {
            email: body.email,
            username: body.username,
            password: body.password,
            full_name: body.full_name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&principal))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, DomainError> {
    let pair = state.auth.login(&body.identifier, &body.password).await?;
    Ok(Json(pair))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshBody>,
) -> Result<impl IntoResponse, DomainError> {
    let pair = state.auth.refresh(&body.refresh_token).await?;
    Ok(Json(pair))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> impl IntoResponse {
    state.auth.logout(&principal);
    Json(MessageResponse {
        message: "Successfully logged out",
    })
}

pub async fn me(CurrentUser(principal): CurrentUser) -> impl IntoResponse {
    Json(UserResponse::from(&principal))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequestBody>,
) -> Result<impl IntoResponse, DomainError> {
    state.auth.request_password_reset(&body.email).await?;
    // Same response whether or not the email exists.
    Ok(Json(MessageResponse {
        message: "If the email exists, a reset link has been sent",
    }))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetConfirmBody>,
) -> Result<impl IntoResponse, DomainError> {
    state
        .auth
        .confirm_password_reset(&body.token, body.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailBody>,
) -> Result<impl IntoResponse, DomainError> {
    let principal = state.auth.verify_email(&body.token).await?;
    Ok(Json(UserResponse::from(&principal)))
}
