//! HTTP API server for the shop backend.
//!
//! Exposes catalog reads and the order workflow over REST, with
//! structured logging (tracing) and Prometheus metrics. Authentication
//! lives upstream; handlers trust the forwarded `x-user-id` header.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{Notifier, OrderWorkflow};
use store::ShopStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, N>(state: Arc<AppState<S, N>>, metrics_handle: PrometheusHandle) -> Router
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S, N>))
        .route("/products", get(routes::products::list::<S, N>))
        .route("/products/{id}", get(routes::products::get::<S, N>))
        .route(
            "/products/{id}/stock",
            put(routes::products::adjust_stock::<S, N>),
        )
        .route("/orders", post(routes::orders::place::<S, N>))
        .route("/orders", get(routes::orders::list::<S, N>))
        .route("/orders/{id}", get(routes::orders::get::<S, N>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S, N>))
        .route("/orders/{id}/status", put(routes::orders::set_status::<S, N>))
        .route("/favorites", get(routes::favorites::list::<S, N>))
        .route(
            "/favorites/{product_id}",
            post(routes::favorites::add::<S, N>).delete(routes::favorites::remove::<S, N>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state around the given store, with the logging
/// notifier standing in for a real mail transport.
pub fn create_state<S: ShopStore + Clone + 'static>(
    store: S,
) -> Arc<AppState<S, orders::LoggingNotifier>> {
    Arc::new(AppState {
        workflow: OrderWorkflow::new(store, orders::LoggingNotifier::new()),
    })
}
