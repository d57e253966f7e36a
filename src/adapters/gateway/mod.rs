//! Payment gateway adapters.

pub mod paypal;
pub mod vnpay;

pub use paypal::PaypalGateway;
pub use vnpay::VnpayGateway;
