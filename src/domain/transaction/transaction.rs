//! The Transaction aggregate - one purchase attempt.
//!
//! Owned exclusively by the transaction orchestrator; buyers and sellers only
//! ever hold read-only views. The commission split is computed once, at
//! creation, from the seller's commission rate at that moment, so later rate
//! changes never move money on in-flight purchases.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::method::PaymentMethod;
use super::status::TransactionStatus;
use crate::domain::foundation::{
    DomainError, ErrorCode, ProductId, StateMachine, TransactionId, UserId,
};

/// Default number of downloads granted per completed purchase.
pub const DEFAULT_MAX_DOWNLOADS: i32 = 5;

/// Outcome reported by a payment gateway callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOutcome {
    Success,
    Failure,
}

impl GatewayOutcome {
    /// The terminal status this outcome maps to.
    pub fn target_status(&self) -> TransactionStatus {
        match self {
            GatewayOutcome::Success => TransactionStatus::Completed,
            GatewayOutcome::Failure => TransactionStatus::Failed,
        }
    }
}

/// Inputs for creating a transaction. Price, currency, and seller always come
/// from the catalog, never from the caller.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub amount: f64,
    pub currency: String,
    pub seller_commission_rate: f64,
    pub payment_method: PaymentMethod,
}

/// One purchase attempt bound to a payment-gateway round trip.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_id: TransactionId,
    pub amount: f64,
    pub currency: String,
    pub commission_amount: f64,
    pub seller_amount: f64,
    pub payment_method: PaymentMethod,
    pub gateway_ref: Option<String>,
    pub status: TransactionStatus,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub download_count: i32,
    pub max_downloads: i32,
    pub download_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Creates a `Pending` transaction with a fresh external id and the
    /// commission split locked to the rate configured right now.
    pub fn create(new: NewTransaction, now: DateTime<Utc>) -> Self {
        let commission_amount = round_cents(new.amount * new.seller_commission_rate);
        let seller_amount = round_cents(new.amount - commission_amount);

        Self {
            id: Uuid::new_v4(),
            transaction_id: TransactionId::generate(),
            amount: new.amount,
            currency: new.currency,
            commission_amount,
            seller_amount,
            payment_method: new.payment_method,
            gateway_ref: None,
            status: TransactionStatus::Pending,
            product_id: new.product_id,
            buyer_id: new.buyer_id,
            seller_id: new.seller_id,
            download_count: 0,
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            download_expiry: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            refunded_at: None,
        }
    }

    /// Records the gateway's own correlation id. Distinct from the external
    /// transaction id: reconciliation joins on the latter, never on this.
    pub fn attach_gateway_ref(&mut self, gateway_ref: impl Into<String>, now: DateTime<Utc>) {
        self.gateway_ref = Some(gateway_ref.into());
        self.updated_at = now;
    }

    /// Applies a gateway callback outcome.
    ///
    /// Idempotent and monotonic: if the transaction is already settled the
    /// call is a no-op returning the stored status, so re-delivered or
    /// out-of-order callbacks cannot undo a terminal state.
    pub fn settle(
        &mut self,
        outcome: GatewayOutcome,
        now: DateTime<Utc>,
    ) -> Result<TransactionStatus, DomainError> {
        if self.status.is_settled() {
            return Ok(self.status);
        }

        let target = self.status.transition_to(outcome.target_status())?;
        self.status = target;
        self.updated_at = now;
        if target == TransactionStatus::Completed {
            self.completed_at = Some(now);
        }
        Ok(target)
    }

    /// Cancels a purchase that has not yet settled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.status = self.status.transition_to(TransactionStatus::Cancelled)?;
        self.updated_at = now;
        Ok(())
    }

    /// Admin-triggered refund of a completed purchase.
    pub fn refund(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.status = self.status.transition_to(TransactionStatus::Refunded)?;
        self.refunded_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Counts one download against the purchase quota.
    ///
    /// Only valid on a completed purchase, within the quota, and before the
    /// download expiry if one is set.
    pub fn record_download(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != TransactionStatus::Completed {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Downloads require a completed purchase",
            ));
        }
        if self.download_count >= self.max_downloads {
            return Err(DomainError::new(
                ErrorCode::DownloadLimitReached,
                format!("Download limit of {} reached", self.max_downloads),
            ));
        }
        if let Some(expiry) = self.download_expiry {
            if now > expiry {
                return Err(DomainError::new(
                    ErrorCode::DownloadLimitReached,
                    "Download window has expired",
                ));
            }
        }
        self.download_count += 1;
        self.updated_at = now;
        Ok(())
    }
}

/// Rounds a currency amount to cents. Amounts are display-scale here; there
/// is deliberately no ledger beneath them.
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
