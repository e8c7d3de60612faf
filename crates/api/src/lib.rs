//! HTTP API server for the storefront.
//!
//! Provides REST endpoints for the catalog, carts and orders, with
//! structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod seed;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use services::{CartService, CatalogService, OrderService};
use store::Storefront;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state for all handlers.
pub struct AppState<S: Storefront> {
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub environment: String,
}

impl<S: Storefront> AppState<S> {
    /// Wires every service onto the same store.
    pub fn new(store: S, order_timeout: Duration, environment: impl Into<String>) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            orders: OrderService::with_timeout(store, order_timeout),
            environment: environment.into(),
        }
    }
}

/// Builds the CORS layer. Without a configured origin any origin is allowed.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(err)) => {
            tracing::warn!(error = %err, "invalid CORS_ORIGIN, allowing any origin");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Storefront>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    cors: CorsLayer,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/api/health", get(routes::health::check::<S>))
        // Catalog
        .route(
            "/api/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route("/api/products/featured", get(routes::products::featured::<S>))
        .route(
            "/api/products/categories",
            get(routes::products::categories::<S>),
        )
        .route(
            "/api/products/{id}",
            get(routes::products::get::<S>)
                .put(routes::products::update::<S>)
                .delete(routes::products::delete::<S>),
        )
        // Cart
        .route("/api/cart", get(routes::cart::get::<S>))
        .route("/api/cart/add", post(routes::cart::add::<S>))
        .route("/api/cart/update", put(routes::cart::update::<S>))
        .route(
            "/api/cart/remove/{product_id}",
            delete(routes::cart::remove::<S>),
        )
        .route("/api/cart/clear", delete(routes::cart::clear::<S>))
        // Orders
        .route(
            "/api/orders",
            get(routes::orders::list::<S>).post(routes::orders::create::<S>),
        )
        .route("/api/orders/myorders", get(routes::orders::mine::<S>))
        .route("/api/orders/stats/summary", get(routes::orders::stats::<S>))
        .route("/api/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/api/orders/{id}/status",
            put(routes::orders::update_status::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .fallback(error::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
