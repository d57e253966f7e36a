//! Transaction status state machine.
//!
//! A purchase starts in `Pending` and moves through the gateway round trip to
//! a terminal outcome. `Refunded` is only reachable from `Completed` via a
//! separately authorized admin transition, never as part of the purchase flow.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created, gateway round trip not yet resolved.
    Pending,

    /// Gateway acknowledged, awaiting final outcome.
    Processing,

    /// Payment confirmed. Immutable afterwards except download counting
    /// and an admin refund.
    Completed,

    /// Gateway reported failure.
    Failed,

    /// Abandoned or cancelled before a gateway outcome.
    Cancelled,

    /// Admin-triggered reversal of a completed payment.
    Refunded,
}

impl TransactionStatus {
    /// Terminal for the purchase flow: no gateway callback may change it.
    ///
    /// `Completed` still admits the admin refund transition, but that is a
    /// distinct, separately authorized operation.
    pub fn is_settled(&self) -> bool {
        !matches!(self, TransactionStatus::Pending | TransactionStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Refunded => "refunded",
        }
    }
}

impl StateMachine for TransactionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, target),
            // From PENDING
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
            // From PROCESSING
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
            // From COMPLETED (admin refund only)
                | (Completed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TransactionStatus::*;
        match self {
            Pending => vec![Processing, Completed, Failed, Cancelled],
            Processing => vec![Completed, Failed, Cancelled],
            Completed => vec![Refunded],
            Failed => vec![],
            Cancelled => vec![],
            Refunded => vec![],
        }
    }
}
