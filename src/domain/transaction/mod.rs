//! Transaction domain: the purchase aggregate and its status machine.

mod method;
mod status;
mod transaction;

pub use method::PaymentMethod;
pub use status::TransactionStatus;
pub use transaction::{GatewayOutcome, NewTransaction, Transaction, DEFAULT_MAX_DOWNLOADS};
