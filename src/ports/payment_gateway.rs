//! Payment gateway port.
//!
//! Adapters are polymorphic over a single capability: turn a payment request
//! into a redirect URL the buyer completes payment at. New providers
//! implement only this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{DomainError, TransactionId};

/// Everything a gateway needs to start a payment.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// External transaction id; becomes the gateway's order reference.
    pub transaction_id: TransactionId,
    pub amount: f64,
    pub currency: String,
    /// Human-readable order description shown on the gateway page.
    pub order_info: String,
    /// Where the gateway sends the buyer back after payment.
    pub return_url: String,
}

/// Result of a successful gateway dispatch.
#[derive(Debug, Clone)]
pub struct PaymentRedirect {
    /// URL the buyer is redirected to.
    pub redirect_url: String,

    /// The provider's own correlation id, when the provider issues one.
    /// Stored on the transaction separately from the external id; it is
    /// never a reconciliation join key.
    pub gateway_ref: Option<String>,
}

/// Errors from gateway adapters.
///
/// Adapter faults are caught at the orchestrator boundary and surfaced as a
/// `GATEWAY_ERROR`; raw transport errors never propagate to callers.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The provider rejected the request.
    #[error("Gateway rejected request: {0}")]
    Rejected(String),

    /// Network or timeout failure reaching the provider.
    #[error("Gateway unreachable: {0}")]
    Transport(String),

    /// The request cannot be expressed for this provider.
    #[error("Unsupported payment request: {0}")]
    Unsupported(String),
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        DomainError::gateway(err.to_string())
    }
}

/// A payment provider integration.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Builds the outbound payment redirect for a pending transaction.
    async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentRedirect, GatewayError>;
}
