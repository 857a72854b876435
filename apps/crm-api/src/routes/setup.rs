//! Administrative account setup.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use super::users::UserResponse;
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiPath};
use crate::state::AppState;
use crm_core::user::normalize_email;
use crm_core::UserRole;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/setup/{email}", post(promote_to_admin))
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub message: String,
    pub user: UserResponse,
}

/// POST /api/setup/{email}
///
/// Grants the admin role. Promoting an existing admin is a no-op.
async fn promote_to_admin(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(email): ApiPath<String>,
) -> Result<Json<PromoteResponse>, ApiError> {
    let email = normalize_email(&email);

    let mut user = state
        .db()
        .users()
        .get_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &email))?;

    let message = if user.update_role(UserRole::Admin) {
        state.db().users().update(&user).await?;
        info!(user_id = user.id(), promoted_by = admin.id, "User promoted to admin");
        format!("User {} is now an admin", email)
    } else {
        format!("User {} is already an admin", email)
    };

    Ok(Json(PromoteResponse {
        message,
        user: UserResponse::from(&user),
    }))
}
