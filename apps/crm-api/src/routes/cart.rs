//! Per-user shopping carts.
//!
//! Every handler checks ownership first. The cart row is created on the
//! first add; reading a cart that was never created returns an empty one.

use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;
use crm_core::validation::{validate_quantity, MAX_LINE_QUANTITY};
use crm_core::{Cart, CartItem, CoreError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/update", put(update_cart_item))
        .route("/api/cart/{user_id}", get(get_cart).delete(clear_cart))
        .route("/api/cart/{user_id}/item/{product_id}", delete(remove_cart_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

/// Cart response including items and totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub user_id: i64,
    pub items: Vec<CartItem>,
    pub item_count: usize,
    pub total_quantity: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            user_id: cart.user_id,
            items: cart.items.clone(),
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total_cents: cart.total().cents(),
        }
    }
}

async fn ensure_user_exists(state: &AppState, user_id: i64) -> Result<(), ApiError> {
    if state.db().users().exists(user_id).await? {
        Ok(())
    } else {
        Err(CoreError::UserNotFound(user_id).into())
    }
}

/// GET /api/cart/{user_id}
async fn get_cart(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<CartResponse>, ApiError> {
    auth.ensure_owner_or_admin(user_id)?;
    ensure_user_exists(&state, user_id).await?;

    let cart = match state.db().carts().find_by_user(user_id).await? {
        Some(cart) => cart,
        None => Cart::new(user_id)?,
    };

    Ok(Json(CartResponse::from(&cart)))
}

/// POST /api/cart/add
///
/// Adding a product already in the cart increases its quantity. The line
/// total may not exceed the product's stock. The increment is applied in
/// SQL, so concurrent adds accumulate.
async fn add_to_cart(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CartItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    auth.ensure_owner_or_admin(req.user_id)?;
    validate_quantity(req.quantity)?;
    ensure_user_exists(&state, req.user_id).await?;

    let product = state
        .db()
        .products()
        .get_by_id(req.product_id)
        .await?
        .ok_or(CoreError::ProductNotFound(req.product_id))?;

    // Checked against the current lines first for precise error messages.
    let mut preview = match state.db().carts().find_by_user(req.user_id).await? {
        Some(cart) => cart,
        None => Cart::new(req.user_id)?,
    };
    preview.add_item(&product, req.quantity)?;

    let cart = state.db().carts().get_or_create(req.user_id).await?;
    let quantity = state
        .db()
        .carts()
        .add_quantity(cart.id, product.id, req.quantity, MAX_LINE_QUANTITY)
        .await?;

    info!(
        user_id = req.user_id,
        product_id = req.product_id,
        quantity,
        "Added to cart"
    );

    let cart = state
        .db()
        .carts()
        .find_by_user(req.user_id)
        .await?
        .ok_or(CoreError::UserNotFound(req.user_id))?;
    Ok(Json(CartResponse::from(&cart)))
}

/// PUT /api/cart/update
///
/// Sets a line's quantity. Zero or less removes the line.
async fn update_cart_item(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CartItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    auth.ensure_owner_or_admin(req.user_id)?;

    let mut cart = state
        .db()
        .carts()
        .find_by_user(req.user_id)
        .await?
        .ok_or(CoreError::CartItemNotFound(req.product_id))?;

    if req.quantity > 0 {
        let product = state
            .db()
            .products()
            .get_by_id(req.product_id)
            .await?
            .ok_or(CoreError::ProductNotFound(req.product_id))?;
        product.ensure_available(req.quantity)?;
    }

    let updated = cart.update_quantity(req.product_id, req.quantity)?.cloned();
    match updated {
        Some(line) => {
            state.db().carts().save_item(cart.id, &line).await?;
        }
        None => {
            state
                .db()
                .carts()
                .remove_item(cart.id, req.product_id)
                .await?;
        }
    }

    debug!(
        user_id = req.user_id,
        product_id = req.product_id,
        quantity = req.quantity,
        "Cart line updated"
    );
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /api/cart/{user_id}/item/{product_id}
async fn remove_cart_item(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((user_id, product_id)): ApiPath<(i64, i64)>,
) -> Result<Json<CartResponse>, ApiError> {
    auth.ensure_owner_or_admin(user_id)?;

    let mut cart = state
        .db()
        .carts()
        .find_by_user(user_id)
        .await?
        .ok_or(CoreError::CartItemNotFound(product_id))?;

    cart.remove_item(product_id)?;
    state.db().carts().remove_item(cart.id, product_id).await?;

    debug!(user_id, product_id, "Removed from cart");
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /api/cart/{user_id}
async fn clear_cart(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<CartResponse>, ApiError> {
    auth.ensure_owner_or_admin(user_id)?;
    ensure_user_exists(&state, user_id).await?;

    let cart = match state.db().carts().find_by_user(user_id).await? {
        Some(mut cart) => {
            state.db().carts().clear(cart.id).await?;
            cart.clear();
            cart
        }
        None => Cart::new(user_id)?,
    };

    info!(user_id, "Cart cleared");
    Ok(Json(CartResponse::from(&cart)))
}
