//! Ports - interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! domain and the outside world. Adapters implement these ports.

mod email_sender;
mod payment_gateway;
mod product_catalog;
mod transaction_repository;
mod user_repository;

pub use email_sender::{EmailError, EmailMessage, EmailSender};
pub use payment_gateway::{GatewayError, PaymentGateway, PaymentRedirect, PaymentRequest};
pub use product_catalog::{ProductCatalog, ProductInfo};
pub use transaction_repository::TransactionRepository;
pub use user_repository::UserRepository;
