//! PostgreSQL implementation of TransactionRepository.
//!
//! Status changes are single conditional UPDATE statements guarded on the
//! stored status, so concurrent gateway callbacks serialize at the row and
//! exactly one wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, ProductId, TransactionId, UserId};
use crate::domain::transaction::{PaymentMethod, Transaction, TransactionStatus};
use crate::ports::TransactionRepository;

const TRANSACTION_COLUMNS: &str = "id, transaction_id, amount, currency, commission_amount, \
     seller_amount, payment_method, gateway_ref, status, product_id, buyer_id, seller_id, \
     download_count, max_downloads, download_expiry, created_at, updated_at, completed_at, \
     refunded_at";

/// PostgreSQL-backed transaction store.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn insert(&self, transaction: &Transaction) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, transaction_id, amount, currency, commission_amount,
                seller_amount, payment_method, gateway_ref, status, product_id,
                buyer_id, seller_id, download_count, max_downloads,
                download_expiry, created_at, updated_at, completed_at, refunded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.transaction_id.as_str())
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(transaction.commission_amount)
        .bind(transaction.seller_amount)
        .bind(transaction.payment_method)
        .bind(&transaction.gateway_ref)
        .bind(transaction.status)
        .bind(transaction.product_id.as_uuid())
        .bind(transaction.buyer_id.as_uuid())
        .bind(transaction.seller_id.as_uuid())
        .bind(transaction.download_count)
        .bind(transaction.max_downloads)
        .bind(transaction.download_expiry)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .bind(transaction.completed_at)
        .bind(transaction.refunded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert transaction: {}", e)))?;
        Ok(())
    }

    async fn find_by_external_id(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, DomainError> {
        let query = format!(
            "SELECT {} FROM transactions WHERE transaction_id = $1",
            TRANSACTION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch transaction: {}", e)))?;
        Ok(row.map(|r| row_to_transaction(&r)))
    }

    async fn set_gateway_ref(
        &self,
        id: &TransactionId,
        gateway_ref: &str,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE transactions SET gateway_ref = $2, updated_at = NOW() \
             WHERE transaction_id = $1",
        )
        .bind(id.as_str())
        .bind(gateway_ref)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to set gateway ref: {}", e)))?;
        Ok(())
    }

    async fn settle_if_open(
        &self,
        id: &TransactionId,
        target: TransactionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $2,
                updated_at = $3,
                completed_at = CASE WHEN $2 = 'completed'::transaction_status
                                    THEN $3 ELSE completed_at END
            WHERE transaction_id = $1
              AND status IN ('pending'::transaction_status, 'processing'::transaction_status)
            "#,
        )
        .bind(id.as_str())
        .bind(target)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to settle transaction: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn refund_if_completed(
        &self,
        id: &TransactionId,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'refunded'::transaction_status,
                refunded_at = $2,
                updated_at = $2
            WHERE transaction_id = $1
              AND status = 'completed'::transaction_status
            "#,
        )
        .bind(id.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to refund transaction: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_download(
        &self,
        id: &TransactionId,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET download_count = download_count + 1,
                updated_at = $2
            WHERE transaction_id = $1
              AND status = 'completed'::transaction_status
              AND download_count < max_downloads
              AND (download_expiry IS NULL OR download_expiry >= $2)
            "#,
        )
        .bind(id.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record download: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_buyer(&self, buyer: UserId) -> Result<Vec<Transaction>, DomainError> {
        self.list_for("buyer_id", buyer).await
    }

    async fn list_by_seller(&self, seller: UserId) -> Result<Vec<Transaction>, DomainError> {
        self.list_for("seller_id", seller).await
    }
}

impl PostgresTransactionRepository {
    async fn list_for(&self, column: &str, user: UserId) -> Result<Vec<Transaction>, DomainError> {
        let query = format!(
            "SELECT {} FROM transactions WHERE {} = $1 ORDER BY created_at DESC",
            TRANSACTION_COLUMNS, column
        );
        let rows = sqlx::query(&query)
            .bind(user.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to list transactions: {}", e)))?;
        Ok(rows.iter().map(row_to_transaction).collect())
    }
}

fn row_to_transaction(row: &PgRow) -> Transaction {
    let payment_method: PaymentMethod = row.get("payment_method");
    let status: TransactionStatus = row.get("status");
    Transaction {
        id: row.get("id"),
        transaction_id: TransactionId::new(row.get::<String, _>("transaction_id")),
        amount: row.get("amount"),
        currency: row.get("currency"),
        commission_amount: row.get("commission_amount"),
        seller_amount: row.get("seller_amount"),
        payment_method,
        gateway_ref: row.get("gateway_ref"),
        status,
        product_id: ProductId::from_uuid(row.get("product_id")),
        buyer_id: UserId::from_uuid(row.get("buyer_id")),
        seller_id: UserId::from_uuid(row.get("seller_id")),
        download_count: row.get("download_count"),
        max_downloads: row.get("max_downloads"),
        download_expiry: row.get("download_expiry"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        completed_at: row.get("completed_at"),
        refunded_at: row.get("refunded_at"),
    }
}
