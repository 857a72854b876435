//! # Order Endpoints
//!
//! ## Placement
//! ```text
//! POST /api/orders
//!      │
//!      ├── caller owns customerId (or is admin)           else 403
//!      ├── userNameOrder, customerId > 0, items non-empty  else 400
//!      ├── customer exists                                else 404
//!      ├── every product exists                           else 404
//!      ├── stock ≥ summed quantity per product            else 400
//!      │
//!      ▼
//! OrderRepository::place   (one transaction, guarded stock decrement)
//!      │
//!      ▼
//! 201 Location: /api/orders/{guid}
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiJson, ApiPath, AuthUser};
use crate::state::AppState;
use crm_core::validation::validate_uuid;
use crm_core::{CoreError, Order, OrderItem, OrderStatus, Product, ValidationError};
use crm_db::OrderSummary;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(create_order))
        .route("/api/orders/customer/{customer_id}", get(list_customer_orders))
        .route("/api/orders/{guid}", get(get_order))
        .route("/api/orders/{guid}/status", put(update_order_status))
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_name_order: String,
    pub customer_id: i64,
    #[serde(default, alias = "description")]
    pub order_description: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub order_guid: String,
    pub customer_id: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub item_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_guid: String,
    pub customer_id: i64,
    pub user_name_order: String,
    pub description: String,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryResponse {
    pub order_guid: String,
    pub user_name_order: String,
    pub description: String,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub total_cents: i64,
    pub item_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        OrderItemResponse {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            line_total_cents: item.line_total().cents(),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let header = order.header();
        OrderResponse {
            order_guid: header.order_guid.clone(),
            customer_id: header.customer_id,
            user_name_order: header.user_name_order.clone(),
            description: header.description.clone(),
            status: header.status,
            order_date: header.order_date,
            total_cents: order.total().cents(),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
        }
    }
}

impl From<OrderSummary> for OrderSummaryResponse {
    fn from(summary: OrderSummary) -> Self {
        OrderSummaryResponse {
            order_guid: summary.order_guid,
            user_name_order: summary.user_name_order,
            description: summary.description,
            status: summary.status,
            order_date: summary.order_date,
            total_cents: summary.total_cents,
            item_count: summary.item_count,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/orders
async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.ensure_owner_or_admin(req.customer_id)?;

    if req.user_name_order.trim().is_empty() || req.customer_id <= 0 || req.items.is_empty() {
        return Err(ApiError::validation(
            "Order must contain a valid username, customer ID, and at least one item",
        ));
    }

    if !state.db().users().exists(req.customer_id).await? {
        return Err(CoreError::UserNotFound(req.customer_id).into());
    }

    let mut order = Order::new(
        &req.user_name_order,
        req.customer_id,
        req.order_description.as_deref(),
    )?;

    let mut products: HashMap<i64, Product> = HashMap::new();
    for line in &req.items {
        let product = match products.entry(line.product_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let product = state
                    .db()
                    .products()
                    .get_by_id(line.product_id)
                    .await?
                    .ok_or(CoreError::ProductNotFound(line.product_id))?;
                entry.insert(product)
            }
        };
        order.add_item(product.id, &product.name, line.quantity, product.price_cents)?;
    }

    // Duplicate lines were merged, so this checks the summed quantity.
    for product in products.values() {
        if let Err(e) = product.ensure_available(order.quantity_of(product.id)) {
            warn!(product_id = product.id, error = %e, "Order rejected");
            return Err(e.into());
        }
    }

    order.ensure_has_items()?;

    let order = state.db().orders().place(&order).await?;

    info!(
        order_guid = %order.guid(),
        customer_id = order.customer_id(),
        total_cents = order.total().cents(),
        "Order created"
    );

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/orders/{}", order.guid()))],
        Json(OrderCreatedResponse {
            order_guid: order.guid().to_string(),
            customer_id: order.customer_id(),
            total_cents: order.total().cents(),
            status: order.status(),
            item_count: order.item_count(),
        }),
    ))
}

async fn load_order(state: &AppState, guid: &str) -> Result<Order, ApiError> {
    validate_uuid(guid)?;

    let order = state
        .db()
        .orders()
        .get_by_guid(guid)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(guid.to_string()))?;

    Ok(order)
}

/// GET /api/orders/{guid}
async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(guid): ApiPath<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = load_order(&state, &guid).await?;
    auth.ensure_owner_or_admin(order.customer_id())?;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /api/orders/customer/{customer_id}
async fn list_customer_orders(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(customer_id): ApiPath<i64>,
) -> Result<Json<Vec<OrderSummaryResponse>>, ApiError> {
    auth.ensure_owner_or_admin(customer_id)?;

    if !state.db().users().exists(customer_id).await? {
        return Err(CoreError::UserNotFound(customer_id).into());
    }

    let orders = state
        .db()
        .orders()
        .list_for_customer(customer_id)
        .await?
        .into_iter()
        .map(OrderSummaryResponse::from)
        .collect();

    Ok(Json(orders))
}

/// PUT /api/orders/{guid}/status
///
/// Cancelling returns the order's stock to the catalog.
async fn update_order_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(guid): ApiPath<String>,
    ApiJson(req): ApiJson<StatusUpdateRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let mut order = load_order(&state, &guid).await?;
    let previous = order.status();

    if previous == req.status {
        return Err(ValidationError::InvalidFormat {
            field: "status".to_string(),
            reason: format!("order is already {}", previous),
        }
        .into());
    }

    order.update_status(req.status)?;
    state.db().orders().save_status(&order, previous).await?;

    info!(
        order_guid = %guid,
        from = %previous,
        to = %req.status,
        admin_id = admin.id,
        "Order status updated"
    );
    Ok(Json(OrderResponse::from(&order)))
}
