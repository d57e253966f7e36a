//! In-memory adapters.
//!
//! Fully functional implementations of the ports backed by mutex-guarded
//! maps. They honor the same conditional-update contracts as the Postgres
//! adapters, which is what makes the service-level tests meaningful.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::auth::Principal;
use crate::domain::foundation::{DomainError, ProductId, TransactionId, UserId};
use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::ports::{
    EmailError, EmailMessage, EmailSender, GatewayError, PaymentGateway, PaymentRedirect,
    PaymentRequest, ProductCatalog, TransactionRepository, UserRepository,
};

/// In-memory principal store.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, Principal>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, principal: &Principal) -> Result<(), DomainError> {
        let mut users = self.users.lock().map_err(poisoned)?;
        users.insert(principal.id, principal.clone());
        Ok(())
    }

    async fn update(&self, principal: &Principal) -> Result<(), DomainError> {
        let mut users = self.users.lock().map_err(poisoned)?;
        users.insert(principal.id, principal.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Principal>, DomainError> {
        let users = self.users.lock().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, DomainError> {
        let users = self.users.lock().map_err(poisoned)?;
        Ok(users.values().find(|p| p.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, DomainError> {
        let users = self.users.lock().map_err(poisoned)?;
        Ok(users.values().find(|p| p.username == username).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Principal>, DomainError> {
        let users = self.users.lock().map_err(poisoned)?;
        Ok(users
            .values()
            .find(|p| p.email == identifier || p.username == identifier)
            .cloned())
    }
}

/// In-memory transaction store with the same conditional-write semantics as
/// the Postgres adapter.
#[derive(Default)]
pub struct InMemoryTransactionRepository {
    transactions: Mutex<HashMap<String, Transaction>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn insert(&self, transaction: &Transaction) -> Result<(), DomainError> {
        let mut map = self.transactions.lock().map_err(poisoned)?;
        map.insert(transaction.transaction_id.as_str().to_string(), transaction.clone());
        Ok(())
    }

    async fn find_by_external_id(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, DomainError> {
        let map = self.transactions.lock().map_err(poisoned)?;
        Ok(map.get(id.as_str()).cloned())
    }

    async fn set_gateway_ref(
        &self,
        id: &TransactionId,
        gateway_ref: &str,
    ) -> Result<(), DomainError> {
        let mut map = self.transactions.lock().map_err(poisoned)?;
        if let Some(tx) = map.get_mut(id.as_str()) {
            tx.attach_gateway_ref(gateway_ref, Utc::now());
        }
        Ok(())
    }

    async fn settle_if_open(
        &self,
        id: &TransactionId,
        target: TransactionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut map = self.transactions.lock().map_err(poisoned)?;
        let Some(tx) = map.get_mut(id.as_str()) else {
            return Ok(false);
        };
        if tx.status.is_settled() {
            return Ok(false);
        }
        tx.status = target;
        tx.updated_at = now;
        if target == TransactionStatus::Completed {
            tx.completed_at = Some(now);
        }
        Ok(true)
    }

    async fn refund_if_completed(
        &self,
        id: &TransactionId,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut map = self.transactions.lock().map_err(poisoned)?;
        let Some(tx) = map.get_mut(id.as_str()) else {
            return Ok(false);
        };
        if tx.status != TransactionStatus::Completed {
            return Ok(false);
        }
        tx.status = TransactionStatus::Refunded;
        tx.refunded_at = Some(now);
        tx.updated_at = now;
        Ok(true)
    }

    async fn record_download(
        &self,
        id: &TransactionId,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut map = self.transactions.lock().map_err(poisoned)?;
        let Some(tx) = map.get_mut(id.as_str()) else {
            return Ok(false);
        };
        let within_expiry = tx.download_expiry.map_or(true, |expiry| now <= expiry);
        if tx.status != TransactionStatus::Completed
            || tx.download_count >= tx.max_downloads
            || !within_expiry
        {
            return Ok(false);
        }
        tx.download_count += 1;
        tx.updated_at = now;
        Ok(true)
    }

    async fn list_by_buyer(&self, buyer: UserId) -> Result<Vec<Transaction>, DomainError> {
        let map = self.transactions.lock().map_err(poisoned)?;
        let mut rows: Vec<Transaction> =
            map.values().filter(|t| t.buyer_id == buyer).cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_by_seller(&self, seller: UserId) -> Result<Vec<Transaction>, DomainError> {
        let map = self.transactions.lock().map_err(poisoned)?;
        let mut rows: Vec<Transaction> =
            map.values().filter(|t| t.seller_id == seller).cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

/// In-memory product catalog.
#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: Mutex<HashMap<ProductId, crate::ports::ProductInfo>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a product.
    pub fn put(&self, product: crate::ports::ProductInfo) {
        if let Ok(mut map) = self.products.lock() {
            map.insert(product.id, product);
        }
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_product(
        &self,
        id: ProductId,
    ) -> Result<Option<crate::ports::ProductInfo>, DomainError> {
        let map = self.products.lock().map_err(poisoned)?;
        Ok(map.get(&id).cloned())
    }
}

/// Gateway stub returning a fixed redirect.
pub struct StaticGateway {
    redirect_url: String,
    gateway_ref: Option<String>,
}

impl StaticGateway {
    pub fn new(redirect_url: impl Into<String>, gateway_ref: Option<&str>) -> Self {
        Self {
            redirect_url: redirect_url.into(),
            gateway_ref: gateway_ref.map(str::to_string),
        }
    }
}

#[async_trait]
impl PaymentGateway for StaticGateway {
    async fn initiate(&self, _request: &PaymentRequest) -> Result<PaymentRedirect, GatewayError> {
        Ok(PaymentRedirect {
            redirect_url: self.redirect_url.clone(),
            gateway_ref: self.gateway_ref.clone(),
        })
    }
}

/// Gateway stub that always fails, for error-path tests.
pub struct FailingGateway;

#[async_trait]
impl PaymentGateway for FailingGateway {
    async fn initiate(&self, _request: &PaymentRequest) -> Result<PaymentRedirect, GatewayError> {
        Err(GatewayError::Transport("connection refused".to_string()))
    }
}

/// Email sender that records every message instead of delivering it.
#[derive(Default)]
pub struct RecordingEmailSender {
    messages: Mutex<Vec<EmailMessage>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut m) = self.messages.lock() {
            m.clear();
        }
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.messages
            .lock()
            .map_err(|_| EmailError::Transport("outbox lock poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> DomainError {
    DomainError::database("in-memory store lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{NewTransaction, PaymentMethod};

    fn transaction() -> Transaction {
        Transaction::create(
            NewTransaction {
                product_id: ProductId::generate(),
                buyer_id: UserId::generate(),
                seller_id: UserId::generate(),
                amount: 10.0,
                currency: "USD".to_string(),
                seller_commission_rate: 0.20,
                payment_method: PaymentMethod::Vnpay,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn settle_if_open_applies_exactly_once() {
        let repo = InMemoryTransactionRepository::new();
        let tx = transaction();
        repo.insert(&tx).await.unwrap();

        let first = repo
            .settle_if_open(&tx.transaction_id, TransactionStatus::Completed, Utc::now())
            .await
            .unwrap();
        let second = repo
            .settle_if_open(&tx.transaction_id, TransactionStatus::Failed, Utc::now())
            .await
            .unwrap();
        assert!(first);
        assert!(!second);

        let stored = repo
            .find_by_external_id(&tx.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TransactionStatus::Completed);
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn refund_if_completed_requires_completed() {
        let repo = InMemoryTransactionRepository::new();
        let tx = transaction();
        repo.insert(&tx).await.unwrap();

        assert!(!repo
            .refund_if_completed(&tx.transaction_id, Utc::now())
            .await
            .unwrap());

        repo.settle_if_open(&tx.transaction_id, TransactionStatus::Completed, Utc::now())
            .await
            .unwrap();
        assert!(repo
            .refund_if_completed(&tx.transaction_id, Utc::now())
            .await
            .unwrap());
        assert!(!repo
            .refund_if_completed(&tx.transaction_id, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn record_download_enforces_quota_atomically() {
        let repo = InMemoryTransactionRepository::new();
        let tx = transaction();
        repo.insert(&tx).await.unwrap();
        repo.settle_if_open(&tx.transaction_id, TransactionStatus::Completed, Utc::now())
            .await
            .unwrap();

        for _ in 0..tx.max_downloads {
            assert!(repo.record_download(&tx.transaction_id, Utc::now()).await.unwrap());
        }
        assert!(!repo.record_download(&tx.transaction_id, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn identifier_lookup_matches_email_or_username() {
        let repo = InMemoryUserRepository::new();
        let principal = Principal::register(
            "bob@example.com",
            "bob",
            None,
            crate::domain::auth::PasswordHash::from_stored("$2b$04$fixture"),
            Utc::now(),
        );
        repo.insert(&principal).await.unwrap();

        assert!(repo.find_by_identifier("bob@example.com").await.unwrap().is_some());
        assert!(repo.find_by_identifier("bob").await.unwrap().is_some());
        assert!(repo.find_by_identifier("someone-else").await.unwrap().is_none());
    }
}
