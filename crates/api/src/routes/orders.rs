//! Order placement, cancellation and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use common::{OrderId, UserId};
use orders::{CartLine, Notifier, OrderWorkflow, PlaceOrder};
use serde::{Deserialize, Serialize};
use store::{Order, Recipient, ShopStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ShopStore, N: Notifier> {
    pub workflow: OrderWorkflow<S, N>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub recipient: RecipientRequest,
    pub lines: Vec<CartLineRequest>,
}

#[derive(Deserialize)]
pub struct RecipientRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct CartLineRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub status: String,
    pub total_cents: i64,
    pub recipient: Recipient,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: u32,
    pub price_cents: i64,
    pub line_total_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product.map(|p| p.to_string()),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price_cents: item.price.cents(),
                line_total_cents: item.line_total().cents(),
            })
            .collect();
        Self {
            id: order.id.to_string(),
            order_number: order.order_number,
            status: order.status.to_string(),
            total_cents: order.total_amount.cents(),
            recipient: order.recipient,
            created_at: order.created_at.to_rfc3339(),
            items,
        }
    }
}

// -- Identity --

// Authentication happens upstream; the gateway forwards the verified
// identity in this header.
const USER_HEADER: &str = "x-user-id";

pub(crate) fn optional_caller(headers: &HeaderMap) -> Result<Option<UserId>, ApiError> {
    match headers.get(USER_HEADER) {
        None => Ok(None),
        Some(value) => {
            let s = value
                .to_str()
                .map_err(|_| ApiError::BadRequest(format!("Invalid {USER_HEADER} header")))?;
            let user = s
                .parse::<UserId>()
                .map_err(|e| ApiError::BadRequest(format!("Invalid {USER_HEADER}: {e}")))?;
            Ok(Some(user))
        }
    }
}

pub(crate) fn required_caller(headers: &HeaderMap) -> Result<UserId, ApiError> {
    optional_caller(headers)?
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {USER_HEADER} header")))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse::<OrderId>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}

// -- Handlers --

/// POST /orders — place an order from a cart.
#[tracing::instrument(skip(state, headers, req))]
pub async fn place<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let user = optional_caller(&headers)?;

    let mut lines = Vec::with_capacity(req.lines.len());
    for line in &req.lines {
        let product_id = line
            .product_id
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("Invalid product_id: {e}")))?;
        lines.push(CartLine {
            product_id,
            quantity: line.quantity,
        });
    }

    let order = state
        .workflow
        .place_order(PlaceOrder {
            user,
            recipient: Recipient {
                first_name: req.recipient.first_name,
                last_name: req.recipient.last_name,
                phone: req.recipient.phone,
                email: req.recipient.email,
                address: req.recipient.address,
                note: req.recipient.note,
            },
            lines,
        })
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(order.into())))
}

/// GET /orders — list the caller's orders, newest first.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let user = required_caller(&headers)?;
    let orders = state.workflow.list_orders(user).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/:id — load one of the caller's orders.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let user = required_caller(&headers)?;
    let order_id = parse_order_id(&id)?;
    let order = state
        .workflow
        .get_order_for_user(order_id, user)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order.into()))
}

/// POST /orders/:id/cancel — cancel one of the caller's orders.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let user = required_caller(&headers)?;
    let order_id = parse_order_id(&id)?;
    let order = state.workflow.cancel_order(order_id, user).await?;
    Ok(Json(order.into()))
}

/// PUT /orders/:id/status — operator status transition (no ownership
/// check; this route sits behind the admin gateway).
#[tracing::instrument(skip(state, req))]
pub async fn set_status<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: ShopStore + Clone + 'static,
    N: Notifier + 'static,
{
    let order_id = parse_order_id(&id)?;
    let status = req
        .status
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid status: {e}")))?;
    let order = state.workflow.advance_status(order_id, status).await?;
    Ok(Json(order.into()))
}
