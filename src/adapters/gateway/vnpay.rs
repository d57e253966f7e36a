//! VNPay payment gateway adapter.
//!
//! Builds the hosted-checkout redirect URL for VNPay's pay command. The
//! request parameters are sorted lexicographically, urlencoded, and signed
//! with HMAC-SHA512; the hex digest travels as the trailing
//! `vnp_SecureHash` parameter and is excluded from its own signing input.
//! Callback signatures are checked the same way, with a constant-time
//! comparison.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use url::form_urlencoded;

use crate::config::PaymentConfig;
use crate::ports::{GatewayError, PaymentGateway, PaymentRedirect, PaymentRequest};

type HmacSha512 = Hmac<Sha512>;

const VNP_VERSION: &str = "2.1.0";
const VNP_COMMAND: &str = "pay";

/// VNPay hosted-checkout integration.
pub struct VnpayGateway {
    tmn_code: String,
    hash_secret: SecretString,
    payment_url: String,
}

impl VnpayGateway {
    pub fn new(
        tmn_code: impl Into<String>,
        hash_secret: SecretString,
        payment_url: impl Into<String>,
    ) -> Self {
        Self {
            tmn_code: tmn_code.into(),
            hash_secret,
            payment_url: payment_url.into(),
        }
    }

    pub fn from_config(config: &PaymentConfig) -> Self {
        Self::new(
            config.vnpay_tmn_code.clone(),
            config.vnpay_hash_secret.clone(),
            config.vnpay_url.clone(),
        )
    }

    /// Signs a sorted, urlencoded parameter set and returns the lowercase
    /// hex digest.
    fn sign(&self, query: &str) -> Result<String, GatewayError> {
        let mut mac = HmacSha512::new_from_slice(self.hash_secret.expose_secret().as_bytes())
            .map_err(|_| GatewayError::Unsupported("empty signing secret".to_string()))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verifies a return/IPN callback's `vnp_SecureHash` against the other
    /// `vnp_` parameters. Comparison is constant-time.
    pub fn verify_callback(&self, params: &BTreeMap<String, String>) -> Result<bool, GatewayError> {
        let Some(presented) = params.get("vnp_SecureHash") else {
            return Ok(false);
        };

        let signed: BTreeMap<&str, &str> = params
            .iter()
            .filter(|(k, _)| k.as_str() != "vnp_SecureHash" && k.as_str() != "vnp_SecureHashType")
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let query = encode_query(signed.into_iter());
        let expected = self.sign(&query)?;

        Ok(expected
            .as_bytes()
            .ct_eq(presented.to_lowercase().as_bytes())
            .into())
    }
}

#[async_trait]
impl PaymentGateway for VnpayGateway {
    async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentRedirect, GatewayError> {
        // VNPay amounts are in minor units of the settlement currency.
        let amount_minor = (request.amount * 100.0).round() as i64;
        if amount_minor <= 0 {
            return Err(GatewayError::Unsupported(format!(
                "non-positive amount {}",
                request.amount
            )));
        }
        let amount = amount_minor.to_string();
        let create_date = Utc::now().format("%Y%m%d%H%M%S").to_string();

        let mut params = BTreeMap::new();
        params.insert("vnp_Version", VNP_VERSION);
        params.insert("vnp_Command", VNP_COMMAND);
        params.insert("vnp_TmnCode", self.tmn_code.as_str());
        params.insert("vnp_Amount", amount.as_str());
        params.insert("vnp_CreateDate", create_date.as_str());
        params.insert("vnp_CurrCode", request.currency.as_str());
        params.insert("vnp_TxnRef", request.transaction_id.as_str());
        params.insert("vnp_OrderInfo", request.order_info.as_str());
        params.insert("vnp_ReturnUrl", request.return_url.as_str());

        let query = encode_query(params.into_iter());
        let secure_hash = self.sign(&query)?;

        Ok(PaymentRedirect {
            redirect_url: format!(
                "{}?{}&vnp_SecureHash={}",
                self.payment_url, query, secure_hash
            ),
            // VNPay issues no id of its own at dispatch; correlation is by
            // vnp_TxnRef.
            gateway_ref: None,
        })
    }
}

/// Urlencodes already-sorted key/value pairs into a query string.
fn encode_query<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TransactionId;

    const TEST_SECRET: &str = "vnpay-test-hash-secret";

    fn gateway() -> VnpayGateway {
        VnpayGateway::new(
            "TESTCODE",
            SecretString::new(TEST_SECRET.to_string()),
            "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html",
        )
    }

    fn request() -> PaymentRequest {
        PaymentRequest {
            transaction_id: TransactionId::new("a1b2c3"),
            amount: 19.99,
            currency: "VND".to_string(),
            order_info: "Payment for transaction a1b2c3".to_string(),
            return_url: "http://localhost:3000/payment/return".to_string(),
        }
    }

    fn query_params(url: &str) -> BTreeMap<String, String> {
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[tokio::test]
    async fn redirect_carries_all_required_fields() {
        let redirect = gateway().initiate(&request()).await.unwrap();
        let params = query_params(&redirect.redirect_url);

        assert_eq!(params["vnp_Version"], "2.1.0");
        assert_eq!(params["vnp_Command"], "pay");
        assert_eq!(params["vnp_TmnCode"], "TESTCODE");
        assert_eq!(params["vnp_Amount"], "1999");
        assert_eq!(params["vnp_CurrCode"], "VND");
        assert_eq!(params["vnp_TxnRef"], "a1b2c3");
        assert!(params.contains_key("vnp_CreateDate"));
        assert!(params.contains_key("vnp_SecureHash"));
        assert!(redirect.gateway_ref.is_none());
    }

    #[tokio::test]
    async fn amount_is_converted_to_minor_units() {
        let mut req = request();
        req.amount = 150000.0;
        let redirect = gateway().initiate(&req).await.unwrap();
        assert_eq!(query_params(&redirect.redirect_url)["vnp_Amount"], "15000000");
    }

    #[tokio::test]
    async fn signature_matches_independent_computation() {
        let redirect = gateway().initiate(&request()).await.unwrap();
        let (_, query) = redirect.redirect_url.split_once('?').unwrap();
        let (signed_part, hash_part) = query.rsplit_once("&vnp_SecureHash=").unwrap();

        let mut mac = HmacSha512::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
        mac.update(signed_part.as_bytes());
        assert_eq!(hash_part, hex::encode(mac.finalize().into_bytes()));
    }

    #[tokio::test]
    async fn signed_parameters_are_sorted() {
        let redirect = gateway().initiate(&request()).await.unwrap();
        let (_, query) = redirect.redirect_url.split_once('?').unwrap();
        let (signed_part, _) = query.rsplit_once("&vnp_SecureHash=").unwrap();

        let keys: Vec<&str> = signed_part
            .split('&')
            .filter_map(|pair| pair.split('=').next())
            .collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[tokio::test]
    async fn roundtrip_callback_verifies() {
        let gw = gateway();
        let redirect = gw.initiate(&request()).await.unwrap();
        let params = query_params(&redirect.redirect_url);
        assert!(gw.verify_callback(&params).unwrap());
    }

    #[tokio::test]
    async fn tampered_callback_fails_verification() {
        let gw = gateway();
        let redirect = gw.initiate(&request()).await.unwrap();
        let mut params = query_params(&redirect.redirect_url);
        params.insert("vnp_Amount".to_string(), "1".to_string());
        assert!(!gw.verify_callback(&params).unwrap());
    }

    #[tokio::test]
    async fn callback_without_hash_fails_verification() {
        let gw = gateway();
        let mut params = BTreeMap::new();
        params.insert("vnp_TxnRef".to_string(), "a1b2c3".to_string());
        assert!(!gw.verify_callback(&params).unwrap());
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let mut req = request();
        req.amount = 0.0;
        let result = gateway().initiate(&req).await;
        assert!(matches!(result, Err(GatewayError::Unsupported(_))));
    }
}
