//! Server entry point: configuration, tracing, database, router, serve.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use codeshare_market::adapters::email::HttpEmailSender;
use codeshare_market::adapters::gateway::{PaypalGateway, VnpayGateway};
use codeshare_market::adapters::http::{build_router, AppState};
use codeshare_market::adapters::postgres::{
    PostgresProductCatalog, PostgresTransactionRepository, PostgresUserRepository,
};
use codeshare_market::application::{AuthService, IdentityResolver, TransactionService};
use codeshare_market::config::AppConfig;
use codeshare_market::domain::auth::TokenService;
use codeshare_market::domain::transaction::PaymentMethod;
use codeshare_market::ports::{
    EmailSender, PaymentGateway, ProductCatalog, TransactionRepository, UserRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(env_filter)
        .init();

    info!(
        environment = ?config.server.environment,
        "starting codeshare-market"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let transactions: Arc<dyn TransactionRepository> =
        Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let catalog: Arc<dyn ProductCatalog> = Arc::new(PostgresProductCatalog::new(pool.clone()));
    let email: Arc<dyn EmailSender> = Arc::new(HttpEmailSender::new(config.email.clone())?);

    let tokens = Arc::new(TokenService::with_ttls(
        &config.auth.jwt_secret,
        config.auth.token_ttls(),
    ));
    let identity = Arc::new(IdentityResolver::new(tokens.clone(), users.clone()));
    let auth = Arc::new(AuthService::new(
        users.clone(),
        tokens.clone(),
        email,
        config.auth.frontend_url.clone(),
    ));

    let mut gateways: HashMap<PaymentMethod, Arc<dyn PaymentGateway>> = HashMap::new();
    gateways.insert(
        PaymentMethod::Vnpay,
        Arc::new(VnpayGateway::from_config(&config.payment)),
    );
    gateways.insert(
        PaymentMethod::Paypal,
        Arc::new(PaypalGateway::new(config.payment.paypal_client_id.clone())),
    );
    let transaction_service = Arc::new(TransactionService::new(
        transactions,
        catalog,
        users,
        gateways,
        config.payment.return_url.clone(),
    ));

    let state = AppState {
        auth,
        transactions: transaction_service,
        identity,
    };
    let router = build_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
