//! Router for the transaction endpoints.
//!
//! - `POST /` - Open a purchase, returns the gateway redirect
//! - `POST /:transaction_id/verify` - Gateway outcome callback (idempotent)
//! - `POST /:transaction_id/refund` - Admin refund of a completed purchase
//! - `POST /:transaction_id/download` - Count one download against the quota
//! - `GET /my/purchases` - Caller's purchases, newest first
//! - `GET /my/sales` - Caller's sales, newest first

use axum::routing::{get, post};
use axum::Router;

use super::super::AppState;
use super::handlers;

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_transaction))
        .route("/:transaction_id/verify", post(handlers::verify_transaction))
        .route("/:transaction_id/refund", post(handlers::refund_transaction))
        .route("/:transaction_id/download", post(handlers::record_download))
        .route("/my/purchases", get(handlers::my_purchases))
        .route("/my/sales", get(handlers::my_sales))
}
