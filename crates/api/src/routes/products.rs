//! Catalog read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use orders::Notifier;
use serde::{Deserialize, Serialize};
use store::{Product, ShopStore};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: u32,
    pub in_stock: bool,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name,
            description: p.description,
            price_cents: p.price.cents(),
            stock: p.stock,
            in_stock: p.stock > 0,
        }
    }
}

/// GET /products — list active products, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let products = state
        .workflow
        .store()
        .list_active_products()
        .await
        .map_err(orders::OrderError::from)?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/:id — load one active product.
#[tracing::instrument(skip(state))]
pub async fn get<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let product_id = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid product ID: {e}")))?;
    let product = state
        .workflow
        .store()
        .find_orderable(product_id)
        .await
        .map_err(orders::OrderError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product.into()))
}

#[derive(Deserialize)]
pub struct StockAdjustment {
    pub delta: i64,
}

/// PUT /products/:id/stock — restock or correct a product's stock level.
///
/// Operator route behind the admin gateway. A negative delta that would
/// take stock below zero is refused with 409, leaving stock untouched.
#[tracing::instrument(skip(state, req))]
pub async fn adjust_stock<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(req): Json<StockAdjustment>,
) -> Result<StatusCode, ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let product_id = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid product ID: {e}")))?;
    let applied = state
        .workflow
        .store()
        .adjust_stock(product_id, req.delta)
        .await
        .map_err(orders::OrderError::from)?;
    if !applied {
        return Err(ApiError::Conflict(format!(
            "Stock adjustment of {} refused for product {id}",
            req.delta
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
