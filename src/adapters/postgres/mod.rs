//! PostgreSQL adapters.

pub mod product_catalog;
pub mod transaction_repository;
pub mod user_repository;

pub use product_catalog::PostgresProductCatalog;
pub use transaction_repository::PostgresTransactionRepository;
pub use user_repository::PostgresUserRepository;
