//! PostgreSQL implementation of ProductCatalog.
//!
//! Read-only view over the products table owned by the catalog service.
//! Only published products are purchasable.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, ProductId, UserId};
use crate::ports::{ProductCatalog, ProductInfo};

/// PostgreSQL-backed catalog lookup.
#[derive(Clone)]
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn get_product(&self, id: ProductId) -> Result<Option<ProductInfo>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, price, currency, seller_id
            FROM products
            WHERE id = $1 AND is_published = TRUE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch product: {}", e)))?;

        Ok(row.map(|r| ProductInfo {
            id: ProductId::from_uuid(r.get("id")),
            title: r.get("title"),
            price: r.get("price"),
            currency: r.get("currency"),
            seller_id: UserId::from_uuid(r.get("seller_id")),
        }))
    }
}
