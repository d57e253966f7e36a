//! PayPal payment gateway adapter.
//!
//! Sandbox placeholder integration: the approval URL is built directly from
//! the external transaction id rather than from a created order. A real
//! order-create round trip would additionally return PayPal's own order id,
//! which is why the `gateway_ref` plumbing is already in place.

use async_trait::async_trait;

use crate::ports::{GatewayError, PaymentGateway, PaymentRedirect, PaymentRequest};

const SANDBOX_CHECKOUT_URL: &str = "https://www.sandbox.paypal.com/checkoutnow";

/// PayPal sandbox integration.
pub struct PaypalGateway {
    client_id: String,
}

impl PaypalGateway {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for PaypalGateway {
    async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentRedirect, GatewayError> {
        if self.client_id.is_empty() {
            return Err(GatewayError::Unsupported(
                "PayPal client id not configured".to_string(),
            ));
        }

        // The provider's correlation id is stored separately from the
        // external transaction id; reconciliation never joins on it. The
        // placeholder integration derives one deterministically.
        let gateway_ref = format!("PAYPAL-{}", request.transaction_id);

        Ok(PaymentRedirect {
            redirect_url: format!(
                "{}?token={}",
                SANDBOX_CHECKOUT_URL,
                request.transaction_id.as_str()
            ),
            gateway_ref: Some(gateway_ref),
        })
    }
}
