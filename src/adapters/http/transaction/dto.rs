//! Request/response DTOs for the transaction endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::transaction::{PaymentMethod, Transaction, TransactionStatus};

#[derive(Debug, Deserialize)]
pub struct CreateTransactionBody {
    pub product_id: Uuid,
    pub payment_method: PaymentMethod,
}

/// Gateway outcome reported back to the verify endpoint.
#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub transaction_id: String,
    pub payment_url: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub transaction_id: String,
    pub status: TransactionStatus,
}

/// Buyer/seller view of a transaction. The external id is the only id
/// exposed; the storage primary key stays internal.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub transaction_id: String,
    pub amount: f64,
    pub currency: String,
    pub commission_amount: f64,
    pub seller_amount: f64,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub product_id: Uuid,
    pub download_count: i32,
    pub max_downloads: i32,
    pub download_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl From<&Transaction> for TransactionResponse {
    fn from(t: &Transaction) -> Self {
        Self {
            transaction_id: t.transaction_id.as_str().to_string(),
            amount: t.amount,
            currency: t.currency.clone(),
            commission_amount: t.commission_amount,
            seller_amount: t.seller_amount,
            payment_method: t.payment_method,
            status: t.status,
            product_id: t.product_id.as_uuid(),
            download_count: t.download_count,
            max_downloads: t.max_downloads,
            download_expiry: t.download_expiry,
            created_at: t.created_at,
            completed_at: t.completed_at,
            refunded_at: t.refunded_at,
        }
    }
}
