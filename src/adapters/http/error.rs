//! Maps domain errors onto HTTP responses.
//!
//! The JSON shape `{error, code}` and the code strings are the client
//! contract; the status mapping here is the only place transport status is
//! decided.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::foundation::{DomainError, ErrorCode};

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidCredentials
        | ErrorCode::Unauthenticated
        | ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,

        ErrorCode::AccountInactive
        | ErrorCode::AccountBanned
        | ErrorCode::Forbidden
        | ErrorCode::DownloadLimitReached => StatusCode::FORBIDDEN,

        ErrorCode::InvalidOrExpiredToken
        | ErrorCode::AlreadyVerified
        | ErrorCode::EmailTaken
        | ErrorCode::UsernameTaken
        | ErrorCode::InvalidStateTransition => StatusCode::BAD_REQUEST,

        ErrorCode::UserNotFound
        | ErrorCode::ProductNotFound
        | ErrorCode::TransactionNotFound => StatusCode::NOT_FOUND,

        ErrorCode::GatewayError | ErrorCode::EmailDeliveryFailed => StatusCode::BAD_GATEWAY,

        ErrorCode::DatabaseError | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = status_for(self.code());
        if status.is_server_error() {
            tracing::error!(code = %self.code(), message = self.message(), "request failed");
        }
        // Internal details stay out of 5xx bodies.
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.message().to_string()
        };
        let body = json!({
            "error": message,
            "code": self.code().to_string(),
        });
        (status, Json(body)).into_response()
    }
}
