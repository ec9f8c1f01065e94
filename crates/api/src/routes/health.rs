//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use orders::Notifier;
use serde::Serialize;
use store::ShopStore;

use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Which store implementation is serving requests.
    pub store: &'static str,
}

/// GET /health — reports liveness and the active store backend.
pub async fn check<S, N>(State(state): State<Arc<AppState<S, N>>>) -> Json<HealthResponse>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    Json(HealthResponse {
        status: "ok",
        store: state.workflow.store().backend_name(),
    })
}
