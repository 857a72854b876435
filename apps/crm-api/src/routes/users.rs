//! User registration, lookup and deletion.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, AuthUser};
use crate::password::hash_password;
use crate::state::AppState;
use crm_core::user::normalize_email;
use crm_core::validation::validate_password;
use crm_core::{CoreError, User, UserRole};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/email/{email}", get(get_user_by_email))
        .route("/api/users/{id}", get(get_user).delete(delete_user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            role: user.role(),
            created_at: user.created_at(),
        }
    }
}

/// POST /api/users/register
async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&req.password)?;

    if state.db().users().email_exists(&req.email).await? {
        return Err(ApiError::conflict(format!(
            "Email {} is already registered",
            normalize_email(&req.email)
        )));
    }

    let hash = hash_password(&req.password)?;
    let user = User::new(&req.name, &req.email, &hash, UserRole::Regular)?;
    let user = state.db().users().insert(&user).await?;

    info!(user_id = user.id(), "User registered");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/users/{}", user.id()))],
        Json(UserResponse::from(&user)),
    ))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.ensure_owner_or_admin(id)?;

    let user = state
        .db()
        .users()
        .get_by_id(id)
        .await?
        .ok_or(CoreError::UserNotFound(id))?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /api/users/email/{email}
async fn get_user_by_email(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(email): ApiPath<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = normalize_email(&email);
    if !auth.is_admin() && email != auth.email {
        return Err(ApiError::forbidden("You can only access your own resources"));
    }

    let user = state
        .db()
        .users()
        .get_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &email))?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /api/users/{id}
///
/// Removes the user's cart and orders with it.
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    auth.ensure_owner_or_admin(id)?;

    state.db().users().delete(id).await?;

    if auth.id == id {
        state.blacklist().revoke(&auth.jti, auth.expires_at).await;
    }

    info!(user_id = id, deleted_by = auth.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
