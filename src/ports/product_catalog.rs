//! Catalog port - the read-only slice of the product service this core needs.
//!
//! Catalog CRUD lives elsewhere; the orchestrator only ever asks it for the
//! authoritative price, currency, and seller of a product. The caller's idea
//! of the price is never trusted.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ProductId, UserId};

/// Authoritative product facts for purchase initiation.
#[derive(Debug, Clone)]
pub struct ProductInfo {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub seller_id: UserId,
}

/// Read-only catalog lookup.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_product(&self, id: ProductId) -> Result<Option<ProductInfo>, DomainError>;
}
