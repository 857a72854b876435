//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Method  Path                                   Auth          Module    │
//! │  ──────  ────                                   ────          ──────    │
//! │  GET     /health                                none          health    │
//! │  POST    /api/auth/login                        none          auth      │
//! │  POST    /api/auth/logout                       bearer        auth      │
//! │  POST    /api/users/register                    none          users     │
//! │  GET     /api/users/{id}                        owner/admin   users     │
//! │  DELETE  /api/users/{id}                        owner/admin   users     │
//! │  GET     /api/users/email/{email}               owner/admin   users     │
//! │  GET     /api/products                          bearer        products  │
//! │  GET     /api/products/{id}                     bearer        products  │
//! │  POST    /api/products/add                      admin         products  │
//! │  PUT     /api/products/update/{id}              admin         products  │
//! │  GET     /api/cart/{userId}                     owner/admin   cart      │
//! │  DELETE  /api/cart/{userId}                     owner/admin   cart      │
//! │  POST    /api/cart/add                          owner/admin   cart      │
//! │  PUT     /api/cart/update                       owner/admin   cart      │
//! │  DELETE  /api/cart/{userId}/item/{productId}    owner/admin   cart      │
//! │  POST    /api/orders                            owner/admin   orders    │
//! │  GET     /api/orders/{guid}                     owner/admin   orders    │
//! │  PUT     /api/orders/{guid}/status              admin         orders    │
//! │  GET     /api/orders/customer/{customerId}      owner/admin   orders    │
//! │  POST    /api/setup/{email}                     admin         setup     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod setup;
pub mod users;

/// Builds the full application router with tracing and CORS layers.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors_allowed_origin);

    let mut app = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(products::routes())
        .merge(cart::routes())
        .merge(orders::routes())
        .merge(setup::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    app
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    match HeaderValue::from_str(origin) {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .allow_credentials(true),
        ),
        Err(_) => {
            warn!(origin = %origin, "Invalid CORS origin, CORS disabled");
            None
        }
    }
}
