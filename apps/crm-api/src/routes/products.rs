//! Product catalog.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tracing::info;

use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiJson, ApiPath, AuthUser};
use crate::state::AppState;
use crm_core::{CoreError, Product, ProductDraft};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/add", post(add_product))
        .route("/api/products/update/{id}", put(update_product))
        .route("/api/products/{id}", get(get_product))
}

/// GET /api/products
async fn list_products(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.db().products().list().await?))
}

/// GET /api/products/{id}
async fn get_product(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db()
        .products()
        .get_by_id(id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;

    Ok(Json(product))
}

/// POST /api/products/add
async fn add_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let product = Product::create(draft)?;
    let product = state.db().products().insert(&product).await?;

    info!(
        product_id = product.id,
        guid = %product.product_guid,
        admin_id = admin.id,
        "Product added"
    );

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/products/{}", product.id))],
        Json(product),
    ))
}

/// PUT /api/products/update/{id}
///
/// The same field rules as creation apply, including a positive price.
async fn update_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> Result<Json<Product>, ApiError> {
    let mut product = state
        .db()
        .products()
        .get_by_id(id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;

    product.apply(draft)?;
    state.db().products().update(&product).await?;

    info!(product_id = id, admin_id = admin.id, "Product updated");
    Ok(Json(product))
}
