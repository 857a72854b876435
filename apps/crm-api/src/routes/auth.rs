//! Login and logout.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::users::UserResponse;
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::middleware::{ApiJson, AuthUser};
use crate::password::verify_password;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/auth/login
///
/// Unknown email and wrong password produce the same 401.
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state.db().users().get_by_email(&req.email).await?;

    let user = match user {
        Some(user) if verify_password(&req.password, user.password_hash()) => user,
        _ => {
            warn!("Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let issued = state.jwt().issue(&user)?;
    info!(user_id = user.id(), jti = %issued.jti, "User logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: UserResponse::from(&user),
    }))
}

/// POST /api/auth/logout
///
/// Revokes the presented token until it expires.
async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Json<MessageResponse> {
    state.blacklist().revoke(&auth.jti, auth.expires_at).await;
    info!(user_id = auth.id, jti = %auth.jti, "User logged out");

    Json(MessageResponse {
        message: "Logged out".to_string(),
    })
}
