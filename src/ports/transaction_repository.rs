//! Repository port for transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::{DomainError, TransactionId, UserId};
use crate::domain::transaction::{Transaction, TransactionStatus};

/// Persistence contract for transactions.
///
/// Status writes are atomic conditional updates so two concurrent gateway
/// callbacks for the same external id cannot both settle the row: the losing
/// write is discarded and the caller re-reads the stored status.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, transaction: &Transaction) -> Result<(), DomainError>;

    /// Lookup by the *external* transaction id shared with gateways, never
    /// the internal primary key.
    async fn find_by_external_id(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, DomainError>;

    /// Stores the gateway's own correlation id after dispatch.
    async fn set_gateway_ref(
        &self,
        id: &TransactionId,
        gateway_ref: &str,
    ) -> Result<(), DomainError>;

    /// Conditionally settles the row: the write only applies while the stored
    /// status is still `Pending` or `Processing`. Returns `true` if this call
    /// won the write, `false` if the row was already settled.
    async fn settle_if_open(
        &self,
        id: &TransactionId,
        target: TransactionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Conditionally refunds: applies only while the stored status is
    /// `Completed`. Returns `true` if the write applied.
    async fn refund_if_completed(
        &self,
        id: &TransactionId,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Atomically counts one download while the purchase is completed and
    /// within quota/expiry. Returns `true` if the download was granted.
    async fn record_download(
        &self,
        id: &TransactionId,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Buyer's purchases, newest first.
    async fn list_by_buyer(&self, buyer: UserId) -> Result<Vec<Transaction>, DomainError>;

    /// Seller's sales, newest first.
    async fn list_by_seller(&self, seller: UserId) -> Result<Vec<Transaction>, DomainError>;
}
