//! Order route handlers.
//!
//! Every handler requires a bearer token. Each mutation runs in one unit of
//! work that is committed only after the whole operation succeeded.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use order_desk_core::{OrderId, OrderItemId, Price, Quantity, UserId};

use super::MessageResponse;
use crate::db::{Store, UnitOfWork};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{NewOrderItem, Order};
use crate::services::orders::OrderService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Order creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub owner_user_id: UserId,
}

/// Line item request body. Quantity must be positive and price non-negative.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub quantity: Quantity,
    pub flavor: String,
    pub size: String,
    pub unit_price: Price,
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub message: String,
    pub order_id: OrderId,
}

#[derive(Debug, Serialize)]
pub struct OrderCancelledResponse {
    pub message: String,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct ItemAddedResponse {
    pub message: String,
    pub item_id: OrderItemId,
    pub order_total: Price,
}

#[derive(Debug, Serialize)]
pub struct ItemRemovedResponse {
    pub message: String,
    pub remaining_item_count: usize,
    pub order: Order,
}

// =============================================================================
// Handlers
// =============================================================================

/// Orders index.
pub async fn index(RequireUser(user): RequireUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Order routes, signed in as {}", user.email),
    })
}

/// Create a `PENDING` order for `owner_user_id`.
pub async fn create_order<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user): RequireUser,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>)> {
    let Json(body) = payload?;

    let mut unit = state.store().begin().await?;
    let order = OrderService::new(&mut unit)
        .create_order(body.owner_user_id)
        .await?;
    unit.commit().await?;

    tracing::debug!(order_id = %order.id, actor = %user.id, "create order handled");
    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            message: format!("Order created successfully. Order ID: {}", order.id),
            order_id: order.id,
        }),
    ))
}

/// Cancel an order.
pub async fn cancel_order<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user): RequireUser,
    path: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderCancelledResponse>> {
    let Path(order_id) = path?;

    let mut unit = state.store().begin().await?;
    let order = OrderService::new(&mut unit)
        .cancel_order(order_id, &user)
        .await?;
    unit.commit().await?;

    Ok(Json(OrderCancelledResponse {
        message: format!("Order {} cancelled", order.id),
        order,
    }))
}

/// List every order. Admin only.
pub async fn list_orders<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user): RequireUser,
) -> Result<Json<OrderListResponse>> {
    let mut unit = state.store().begin().await?;
    let orders = OrderService::new(&mut unit).list_orders(&user).await?;
    drop(unit);

    Ok(Json(OrderListResponse { orders }))
}

/// Add a line item to an order.
pub async fn add_item<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user): RequireUser,
    path: std::result::Result<Path<OrderId>, PathRejection>,
    payload: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<ItemAddedResponse>> {
    let Path(order_id) = path?;
    let Json(body) = payload?;

    let mut unit = state.store().begin().await?;
    let added = OrderService::new(&mut unit)
        .add_item(
            order_id,
            NewOrderItem {
                quantity: body.quantity,
                flavor: body.flavor,
                size: body.size,
                unit_price: body.unit_price,
            },
            &user,
        )
        .await?;
    unit.commit().await?;

    Ok(Json(ItemAddedResponse {
        message: format!("Item added to order {order_id}"),
        item_id: added.item.id,
        order_total: added.order.total_price,
    }))
}

/// Remove a line item from its order.
pub async fn remove_item<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user): RequireUser,
    path: std::result::Result<Path<OrderItemId>, PathRejection>,
) -> Result<Json<ItemRemovedResponse>> {
    let Path(item_id) = path?;

    let mut unit = state.store().begin().await?;
    let removed = OrderService::new(&mut unit)
        .remove_item(item_id, &user)
        .await?;
    unit.commit().await?;

    Ok(Json(ItemRemovedResponse {
        message: format!("Item {item_id} removed"),
        remaining_item_count: removed.remaining_item_count,
        order: removed.order,
    }))
}
