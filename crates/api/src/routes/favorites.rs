//! Per-user favorites endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::ProductId;
use orders::Notifier;
use serde::Serialize;
use store::{ShopStore, StoreError};

use crate::error::ApiError;
use crate::routes::orders::{AppState, required_caller};
use crate::routes::products::ProductResponse;

#[derive(Serialize)]
pub struct FavoriteStatusResponse {
    pub status: &'static str,
}

fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid product ID: {e}")))
}

/// GET /favorites — list the caller's favorite products, newest first.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProductResponse>>, ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let user = required_caller(&headers)?;
    let products = state
        .workflow
        .store()
        .list_favorites(user)
        .await
        .map_err(orders::OrderError::from)?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// POST /favorites/:product_id — add a product to the caller's favorites.
///
/// 201 when newly added, 200 when it was already a favorite.
#[tracing::instrument(skip(state, headers))]
pub async fn add<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<FavoriteStatusResponse>), ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let user = required_caller(&headers)?;
    let product_id = parse_product_id(&id)?;

    let added = state
        .workflow
        .store()
        .add_favorite(user, product_id)
        .await
        .map_err(|e| match e {
            StoreError::ProductNotFound(_) => {
                ApiError::NotFound(format!("Product {id} not found"))
            }
            other => ApiError::Order(orders::OrderError::Store(other)),
        })?;

    if added {
        Ok((
            StatusCode::CREATED,
            Json(FavoriteStatusResponse { status: "added" }),
        ))
    } else {
        Ok((
            StatusCode::OK,
            Json(FavoriteStatusResponse { status: "exists" }),
        ))
    }
}

/// DELETE /favorites/:product_id — remove a product from the caller's
/// favorites.
#[tracing::instrument(skip(state, headers))]
pub async fn remove<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<FavoriteStatusResponse>, ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let user = required_caller(&headers)?;
    let product_id = parse_product_id(&id)?;

    let removed = state
        .workflow
        .store()
        .remove_favorite(user, product_id)
        .await
        .map_err(orders::OrderError::from)?;

    if !removed {
        return Err(ApiError::NotFound(format!(
            "Product {id} is not a favorite"
        )));
    }
    Ok(Json(FavoriteStatusResponse { status: "removed" }))
}
