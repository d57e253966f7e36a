//! HTTP surface: routing, middleware, and transport-level error mapping.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod transaction;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::application::{AuthService, IdentityResolver, TransactionService};
use crate::config::ServerConfig;

pub use auth::auth_routes;
pub use middleware::{auth_middleware, CurrentUser, RequireAdmin};
pub use transaction::transaction_routes;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub transactions: Arc<TransactionService>,
    pub identity: Arc<IdentityResolver>,
}

/// Builds the complete application router.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let cors = cors_layer(&server.cors_origins_list());
    let timeout = TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs));
    let identity = state.identity.clone();

    Router::new()
        .nest("/api/v1/auth", auth_routes())
        .nest("/api/v1/transactions", transaction_routes())
        .route("/health", get(health))
        .layer(axum::middleware::from_fn_with_state(
            identity,
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
