use axum::{
    middleware,
    routing::{get, patch, post},
    serve, Json, Router,
};
use serde_json::{json, Value};
use shop_types::ports::auth::{PasswordHasher, TokenIssuer};
use shop_types::ports::payment::PaymentGateway;
use shop_types::ports::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::rate_limit::{self, RateLimiter};
use super::{auth, inventory, orders};
use crate::application::auth_service::AuthService;
use crate::application::inventory_service::InventoryService;
use crate::application::order_service::OrderService;
use crate::cache::ResponseCache;

const LIMITER_PRUNE_EVERY: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

/// Services shared by every handler.
pub struct AppState<S: Store> {
    pub auth: Arc<AuthService<S>>,
    pub inventory: Arc<InventoryService<S>>,
    pub orders: Arc<OrderService<S>>,
    pub limiter: Arc<RateLimiter>,
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            inventory: self.inventory.clone(),
            orders: self.orders.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

impl<S: Store> AppState<S> {
    pub fn new(
        store: Arc<S>,
        cache: Arc<ResponseCache>,
        payment: Arc<dyn PaymentGateway>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        rate_limit_per_minute: u32,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(store.clone(), hasher, tokens)),
            inventory: Arc::new(InventoryService::new(store.clone(), cache.clone())),
            orders: Arc::new(OrderService::new(store, cache, payment)),
            limiter: Arc::new(RateLimiter::per_minute(rate_limit_per_minute)),
        }
    }
}

pub struct HttpServer<S: Store> {
    pub state: AppState<S>,
    pub config: HttpServerConfig,
}

impl<S: Store> HttpServer<S> {
    pub fn new(state: AppState<S>, config: HttpServerConfig) -> Self {
        Self { state, config }
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        // Every order route counts against the caller's window, including
        // requests that are later rejected as unauthenticated.
        let order_routes = Router::new()
            .route("/api/orders", post(orders::create_order::<S>))
            .route("/api/orders/my-orders", get(orders::my_orders::<S>))
            .route("/api/orders/all", get(orders::all_orders::<S>))
            .route("/api/orders/{order_id}", get(orders::get_order::<S>))
            .route("/api/orders/{order_id}/cancel", get(orders::cancel_order::<S>))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                rate_limit::enforce::<S>,
            ));

        Router::new()
            .route("/health", get(health))
            .route("/api/auth/register", post(auth::register::<S>))
            .route("/api/auth/login", post(auth::login::<S>))
            .route("/api/auth/profile", get(auth::profile::<S>))
            .route(
                "/api/inventory/products",
                get(inventory::list_products::<S>).post(inventory::create_product::<S>),
            )
            .route("/api/inventory/products/{product_id}", get(inventory::get_product::<S>))
            .route(
                "/api/inventory/products/{product_id}/stock",
                patch(inventory::update_stock::<S>),
            )
            .merge(order_routes)
            .fallback(not_found)
            .layer(CorsLayer::permissive())
            .layer(trace_layer)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let limiter = self.state.limiter.clone();
        let pruner = tokio::spawn(async move {
            let mut tick = tokio::time::interval(LIMITER_PRUNE_EVERY);
            loop {
                tick.tick().await;
                let dropped = limiter.prune();
                if dropped > 0 {
                    tracing::debug!(dropped, "closed rate-limit windows pruned");
                }
            }
        });

        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!(%addr, "starting server");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let served = serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;
        pruner.abort();
        served?;
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> (axum::http::StatusCode, Json<Value>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}
