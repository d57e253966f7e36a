//! Transaction orchestration: create, reconcile, refund, list, download.
//!
//! All transaction state changes flow through here. Creation trusts the
//! catalog for price and seller, never the caller; settlement trusts the
//! stored row's conditional update, never in-memory state, so concurrent
//! gateway callbacks resolve to exactly one winner.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::auth::Principal;
use crate::domain::foundation::{DomainError, ErrorCode, ProductId, TransactionId};
use crate::domain::transaction::{
    GatewayOutcome, NewTransaction, PaymentMethod, Transaction, TransactionStatus,
};
use crate::ports::{
    PaymentGateway, PaymentRequest, ProductCatalog, TransactionRepository, UserRepository,
};

/// What the buyer gets back from a checkout: the external id to track and the
/// gateway URL to complete payment at.
#[derive(Debug, Clone)]
pub struct CheckoutRedirect {
    pub transaction_id: TransactionId,
    pub payment_url: String,
}

/// Orchestrates the purchase lifecycle.
pub struct TransactionService {
    transactions: Arc<dyn TransactionRepository>,
    catalog: Arc<dyn ProductCatalog>,
    users: Arc<dyn UserRepository>,
    gateways: HashMap<PaymentMethod, Arc<dyn PaymentGateway>>,
    return_url: String,
}

impl TransactionService {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        catalog: Arc<dyn ProductCatalog>,
        users: Arc<dyn UserRepository>,
        gateways: HashMap<PaymentMethod, Arc<dyn PaymentGateway>>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            transactions,
            catalog,
            users,
            gateways,
            return_url: return_url.into(),
        }
    }

    /// Opens a purchase: creates a `Pending` transaction priced from the
    /// catalog, with the commission split locked to the seller's current
    /// rate, and dispatches the payment request to the chosen gateway.
    pub async fn create(
        &self,
        buyer: &Principal,
        product_id: ProductId,
        payment_method: PaymentMethod,
    ) -> Result<CheckoutRedirect, DomainError> {
        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or_else(|| DomainError::product_not_found(product_id))?;

        let seller = self.users.find_by_id(product.seller_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Seller missing for product {}", product_id),
            )
        })?;

        let now = Utc::now();
        let transaction = Transaction::create(
            NewTransaction {
                product_id,
                buyer_id: buyer.id,
                seller_id: product.seller_id,
                amount: product.price,
                currency: product.currency.clone(),
                seller_commission_rate: seller.commission_rate,
                payment_method,
            },
            now,
        );
        self.transactions.insert(&transaction).await?;

        let gateway = self.gateways.get(&payment_method).ok_or_else(|| {
            DomainError::gateway(format!(
                "No gateway configured for {}",
                payment_method.as_str()
            ))
        })?;

        let request = PaymentRequest {
            transaction_id: transaction.transaction_id.clone(),
            amount: transaction.amount,
            currency: transaction.currency.clone(),
            order_info: format!("Payment for {}", product.title),
            return_url: self.return_url.clone(),
        };
        let redirect = gateway.initiate(&request).await.map_err(DomainError::from)?;

        if let Some(gateway_ref) = &redirect.gateway_ref {
            self.transactions
                .set_gateway_ref(&transaction.transaction_id, gateway_ref)
                .await?;
        }

        info!(
            transaction_id = %transaction.transaction_id,
            method = payment_method.as_str(),
            amount = transaction.amount,
            "transaction created"
        );
        Ok(CheckoutRedirect {
            transaction_id: transaction.transaction_id,
            payment_url: redirect.redirect_url,
        })
    }

    /// Applies a gateway callback outcome to the stored transaction.
    ///
    /// Idempotent and monotonic: an already-settled transaction is left
    /// untouched and its stored status returned, so redelivered or
    /// out-of-order callbacks can never undo a terminal state. Concurrent
    /// callbacks race on a conditional write; the loser re-reads and returns
    /// whatever the winner stored.
    pub async fn reconcile(
        &self,
        transaction_id: &TransactionId,
        outcome: GatewayOutcome,
    ) -> Result<TransactionStatus, DomainError> {
        let transaction = self
            .transactions
            .find_by_external_id(transaction_id)
            .await?
            .ok_or_else(|| DomainError::transaction_not_found(transaction_id))?;

        if transaction.status.is_settled() {
            info!(
                transaction_id = %transaction_id,
                status = transaction.status.as_str(),
                "callback for already-settled transaction ignored"
            );
            return Ok(transaction.status);
        }

        let target = outcome.target_status();
        let won = self
            .transactions
            .settle_if_open(transaction_id, target, Utc::now())
            .await?;
        if won {
            info!(
                transaction_id = %transaction_id,
                status = target.as_str(),
                "transaction settled"
            );
            return Ok(target);
        }

        // Lost the race; report what the winner stored.
        let settled = self
            .transactions
            .find_by_external_id(transaction_id)
            .await?
            .ok_or_else(|| DomainError::transaction_not_found(transaction_id))?;
        warn!(
            transaction_id = %transaction_id,
            status = settled.status.as_str(),
            "lost settlement race, keeping stored status"
        );
        Ok(settled.status)
    }

    /// Admin refund of a completed purchase. Replayed refunds of an
    /// already-refunded transaction succeed without a second write.
    pub async fn refund(
        &self,
        admin: &Principal,
        transaction_id: &TransactionId,
    ) -> Result<TransactionStatus, DomainError> {
        if !admin.role.is_admin() {
            return Err(DomainError::forbidden("Not enough permissions"));
        }

        let transaction = self
            .transactions
            .find_by_external_id(transaction_id)
            .await?
            .ok_or_else(|| DomainError::transaction_not_found(transaction_id))?;

        let won = self
            .transactions
            .refund_if_completed(transaction_id, Utc::now())
            .await?;
        if won {
            info!(transaction_id = %transaction_id, "transaction refunded");
            return Ok(TransactionStatus::Refunded);
        }

        if transaction.status == TransactionStatus::Refunded {
            return Ok(TransactionStatus::Refunded);
        }
        Err(DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!(
                "Cannot refund transaction in status {}",
                transaction.status.as_str()
            ),
        ))
    }

    /// The caller's purchases, newest first.
    pub async fn list_purchases(&self, buyer: &Principal) -> Result<Vec<Transaction>, DomainError> {
        self.transactions.list_by_buyer(buyer.id).await
    }

    /// The caller's sales, newest first.
    pub async fn list_sales(&self, seller: &Principal) -> Result<Vec<Transaction>, DomainError> {
        self.transactions.list_by_seller(seller.id).await
    }

    /// Grants one download against the purchase quota.
    ///
    /// Only the buyer of a completed purchase may download, and only while
    /// within quota and before any download expiry.
    pub async fn record_download(
        &self,
        buyer: &Principal,
        transaction_id: &TransactionId,
    ) -> Result<Transaction, DomainError> {
        let transaction = self
            .transactions
            .find_by_external_id(transaction_id)
            .await?
            .ok_or_else(|| DomainError::transaction_not_found(transaction_id))?;

        if transaction.buyer_id != buyer.id {
            return Err(DomainError::forbidden("Not your purchase"));
        }
        if transaction.status != TransactionStatus::Completed {
            return Err(DomainError::forbidden(
                "Downloads require a completed purchase",
            ));
        }

        let granted = self
            .transactions
            .record_download(transaction_id, Utc::now())
            .await?;
        if !granted {
            return Err(DomainError::new(
                ErrorCode::DownloadLimitReached,
                format!("Download limit of {} reached", transaction.max_downloads),
            ));
        }

        self.transactions
            .find_by_external_id(transaction_id)
            .await?
            .ok_or_else(|| DomainError::transaction_not_found(transaction_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryProductCatalog, InMemoryTransactionRepository, InMemoryUserRepository,
        StaticGateway,
    };
    use crate::domain::auth::PasswordHash;
    use crate::domain::foundation::UserRole;
    use crate::ports::ProductInfo;

    struct Fixture {
        service: TransactionService,
        transactions: Arc<InMemoryTransactionRepository>,
        buyer: Principal,
        admin: Principal,
        product_id: ProductId,
    }

    fn principal(role: UserRole) -> Principal {
        let mut p = Principal::register(
            format!("{}@example.com", uuid::Uuid::new_v4()),
            uuid::Uuid::new_v4().to_string(),
            None,
            PasswordHash::from_stored("$2b$04$fixture"),
            Utc::now(),
        );
        p.role = role;
        p
    }

    async fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let transactions = Arc::new(InMemoryTransactionRepository::new());
        let catalog = Arc::new(InMemoryProductCatalog::new());

        let buyer = principal(UserRole::Buyer);
        let mut seller = principal(UserRole::Seller);
        seller.commission_rate = 0.20;
        let admin = principal(UserRole::Admin);
        users.insert(&buyer).await.unwrap();
        users.insert(&seller).await.unwrap();
        users.insert(&admin).await.unwrap();

        let product_id = ProductId::generate();
        catalog.put(ProductInfo {
            id: product_id,
            title: "Rust Snippets Pack".to_string(),
            price: 19.99,
            currency: "USD".to_string(),
            seller_id: seller.id,
        });

        let mut gateways: HashMap<PaymentMethod, Arc<dyn PaymentGateway>> = HashMap::new();
        gateways.insert(
            PaymentMethod::Vnpay,
            Arc::new(StaticGateway::new("https://pay.example/redirect", None)),
        );
        gateways.insert(
            PaymentMethod::Paypal,
            Arc::new(StaticGateway::new(
                "https://paypal.example/checkout",
                Some("PAYID-XYZ"),
            )),
        );

        let service = TransactionService::new(
            transactions.clone(),
            catalog,
            users,
            gateways,
            "http://localhost:3000/payment/return",
        );
        Fixture {
            service,
            transactions,
            buyer,
            admin,
            product_id,
        }
    }

    #[tokio::test]
    async fn checkout_creates_pending_transaction_with_catalog_price() {
        let fx = fixture().await;
        let redirect = fx
            .service
            .create(&fx.buyer, fx.product_id, PaymentMethod::Vnpay)
            .await
            .unwrap();
        assert_eq!(redirect.payment_url, "https://pay.example/redirect");

        let stored = fx
            .transactions
            .find_by_external_id(&redirect.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, TransactionStatus::Pending);
        assert_eq!(stored.amount, 19.99);
        assert_eq!(stored.commission_amount, 4.00);
        assert_eq!(stored.seller_amount, 15.99);
        assert!(stored.gateway_ref.is_none());
    }

    #[tokio::test]
    async fn paypal_checkout_stores_the_gateway_ref() {
        let fx = fixture().await;
        let redirect = fx
            .service
            .create(&fx.buyer, fx.product_id, PaymentMethod::Paypal)
            .await
            .unwrap();

        let stored = fx
            .transactions
            .find_by_external_id(&redirect.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.gateway_ref.as_deref(), Some("PAYID-XYZ"));
        assert_ne!(stored.gateway_ref.as_deref(), Some(stored.transaction_id.as_str()));
    }

    #[tokio::test]
    async fn unknown_product_fails_checkout() {
        let fx = fixture().await;
        let err = fx
            .service
            .create(&fx.buyer, ProductId::generate(), PaymentMethod::Vnpay)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProductNotFound);
    }

    #[tokio::test]
    async fn success_callback_completes_and_redelivery_is_a_noop() {
        let fx = fixture().await;
        let redirect = fx
            .service
            .create(&fx.buyer, fx.product_id, PaymentMethod::Vnpay)
            .await
            .unwrap();

        let first = fx
            .service
            .reconcile(&redirect.transaction_id, GatewayOutcome::Success)
            .await
            .unwrap();
        assert_eq!(first, TransactionStatus::Completed);

        let replay = fx
            .service
            .reconcile(&redirect.transaction_id, GatewayOutcome::Success)
            .await
            .unwrap();
        assert_eq!(replay, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn late_failure_cannot_undo_a_completed_transaction() {
        let fx = fixture().await;
        let redirect = fx
            .service
            .create(&fx.buyer, fx.product_id, PaymentMethod::Vnpay)
            .await
            .unwrap();
        fx.service
            .reconcile(&redirect.transaction_id, GatewayOutcome::Success)
            .await
            .unwrap();

        let status = fx
            .service
            .reconcile(&redirect.transaction_id, GatewayOutcome::Failure)
            .await
            .unwrap();
        assert_eq!(status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn callback_for_unknown_transaction_fails() {
        let fx = fixture().await;
        let err = fx
            .service
            .reconcile(&TransactionId::generate(), GatewayOutcome::Success)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TransactionNotFound);
    }

    #[tokio::test]
    async fn refund_requires_admin_and_completed_status() {
        let fx = fixture().await;
        let redirect = fx
            .service
            .create(&fx.buyer, fx.product_id, PaymentMethod::Vnpay)
            .await
            .unwrap();

        let not_admin = fx
            .service
            .refund(&fx.buyer, &redirect.transaction_id)
            .await
            .unwrap_err();
        assert_eq!(not_admin.code(), ErrorCode::Forbidden);

        let still_pending = fx
            .service
            .refund(&fx.admin, &redirect.transaction_id)
            .await
            .unwrap_err();
        assert_eq!(still_pending.code(), ErrorCode::InvalidStateTransition);

        fx.service
            .reconcile(&redirect.transaction_id, GatewayOutcome::Success)
            .await
            .unwrap();
        let refunded = fx
            .service
            .refund(&fx.admin, &redirect.transaction_id)
            .await
            .unwrap();
        assert_eq!(refunded, TransactionStatus::Refunded);

        // Replayed refund of an already-refunded transaction succeeds.
        let replay = fx
            .service
            .refund(&fx.admin, &redirect.transaction_id)
            .await
            .unwrap();
        assert_eq!(replay, TransactionStatus::Refunded);
    }

    #[tokio::test]
    async fn downloads_are_buyer_only_and_quota_bounded() {
        let fx = fixture().await;
        let redirect = fx
            .service
            .create(&fx.buyer, fx.product_id, PaymentMethod::Vnpay)
            .await
            .unwrap();

        // Not completed yet.
        let early = fx
            .service
            .record_download(&fx.buyer, &redirect.transaction_id)
            .await
            .unwrap_err();
        assert_eq!(early.code(), ErrorCode::Forbidden);

        fx.service
            .reconcile(&redirect.transaction_id, GatewayOutcome::Success)
            .await
            .unwrap();

        let stranger = principal(UserRole::Buyer);
        let not_yours = fx
            .service
            .record_download(&stranger, &redirect.transaction_id)
            .await
            .unwrap_err();
        assert_eq!(not_yours.code(), ErrorCode::Forbidden);

        let mut last_count = 0;
        for _ in 0..crate::domain::transaction::DEFAULT_MAX_DOWNLOADS {
            let tx = fx
                .service
                .record_download(&fx.buyer, &redirect.transaction_id)
                .await
                .unwrap();
            last_count = tx.download_count;
        }
        assert_eq!(last_count, crate::domain::transaction::DEFAULT_MAX_DOWNLOADS);

        let over = fx
            .service
            .record_download(&fx.buyer, &redirect.transaction_id)
            .await
            .unwrap_err();
        assert_eq!(over.code(), ErrorCode::DownloadLimitReached);
    }

    #[tokio::test]
    async fn purchase_and_sales_listings_are_scoped_to_the_caller() {
        let fx = fixture().await;
        fx.service
            .create(&fx.buyer, fx.product_id, PaymentMethod::Vnpay)
            .await
            .unwrap();
        fx.service
            .create(&fx.buyer, fx.product_id, PaymentMethod::Paypal)
            .await
            .unwrap();

        let purchases = fx.service.list_purchases(&fx.buyer).await.unwrap();
        assert_eq!(purchases.len(), 2);

        let someone_else = principal(UserRole::Buyer);
        let none = fx.service.list_purchases(&someone_else).await.unwrap();
        assert!(none.is_empty());
    }
}
