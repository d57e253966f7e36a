//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (VNPay and PayPal)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// VNPay merchant terminal code
    pub vnpay_tmn_code: String,

    /// VNPay HMAC-SHA512 hash secret shared with the gateway
    pub vnpay_hash_secret: SecretString,

    /// VNPay payment page base URL
    #[serde(default = "default_vnpay_url")]
    pub vnpay_url: String,

    /// PayPal client id (sandbox placeholder integration)
    #[serde(default)]
    pub paypal_client_id: String,

    /// URL the gateway redirects buyers back to
    #[serde(default = "default_return_url")]
    pub return_url: String,
}

impl PaymentConfig {
    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.vnpay_tmn_code.is_empty() {
            return Err(ValidationError::MissingRequired("VNPAY_TMN_CODE"));
        }
        if self.vnpay_hash_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("VNPAY_HASH_SECRET"));
        }
        if !self.vnpay_url.starts_with("http://") && !self.vnpay_url.starts_with("https://") {
            return Err(ValidationError::InvalidVnpayUrl);
        }
        Ok(())
    }
}

fn default_vnpay_url() -> String {
    "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string()
}

fn default_return_url() -> String {
    "http://localhost:3000/payment/return".to_string()
}
