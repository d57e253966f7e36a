//! HTTP handlers for the transaction endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::domain::foundation::{DomainError, ProductId, TransactionId};
use crate::domain::transaction::GatewayOutcome;

use super::super::middleware::{CurrentUser, RequireAdmin, RequireSeller};
use super::super::AppState;
use super::dto::{
    CheckoutResponse, CreateTransactionBody, StatusResponse, TransactionResponse, VerifyBody,
};

pub async fn create_transaction(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(body): Json<CreateTransactionBody>,
) -> Result<impl IntoResponse, DomainError> {
    let redirect = state
        .transactions
        .create(
            &principal,
            ProductId::from_uuid(body.product_id),
            body.payment_method,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            transaction_id: redirect.transaction_id.as_str().to_string(),
            payment_url: redirect.payment_url,
        }),
    ))
}

/// Gateway outcome callback. Idempotent: replays and late out-of-order
/// deliveries return the stored status without changing it.
pub async fn verify_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    Json(body): Json<VerifyBody>,
) -> Result<impl IntoResponse, DomainError> {
    let id = TransactionId::new(transaction_id);
    let outcome = if body.success {
        GatewayOutcome::Success
    } else {
        GatewayOutcome::Failure
    };
    let status = state.transactions.reconcile(&id, outcome).await?;
    Ok(Json(StatusResponse {
        transaction_id: id.as_str().to_string(),
        status,
    }))
}

pub async fn refund_transaction(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, DomainError> {
    let id = TransactionId::new(transaction_id);
    let status = state.transactions.refund(&admin, &id).await?;
    Ok(Json(StatusResponse {
        transaction_id: id.as_str().to_string(),
        status,
    }))
}

pub async fn record_download(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, DomainError> {
    let id = TransactionId::new(transaction_id);
    let transaction = state.transactions.record_download(&principal, &id).await?;
    Ok(Json(TransactionResponse::from(&transaction)))
}

pub async fn my_purchases(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<impl IntoResponse, DomainError> {
    let rows = state.transactions.list_purchases(&principal).await?;
    let views: Vec<TransactionResponse> = rows.iter().map(TransactionResponse::from).collect();
    Ok(Json(views))
}

pub async fn my_sales(
    State(state): State<AppState>,
    RequireSeller(principal): RequireSeller,
) -> Result<impl IntoResponse, DomainError> {
    let rows = state.transactions.list_sales(&principal).await?;
    let views: Vec<TransactionResponse> = rows.iter().map(TransactionResponse::from).collect();
    Ok(Json(views))
}
