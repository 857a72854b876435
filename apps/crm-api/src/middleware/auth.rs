//! # Authentication Extractors
//!
//! ```text
//! Authorization: Bearer <jwt>
//!      │
//!      ▼
//! extract_bearer_token ──► none ──────────────────► 401 "Missing bearer token"
//!      │
//!      ▼
//! JwtManager::validate ──► bad sig / expired / ──► 401 "Invalid or expired token"
//!      │                   wrong iss or aud
//!      ▼
//! TokenBlacklist::is_revoked(jti) ──► yes ────────► 401 "Token has been invalidated"
//!      │
//!      ▼
//! AuthUser ──► AdminUser (role != Admin ──────────► 403)
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};

use crate::auth::{extract_bearer_token, AuthError};
use crate::error::ApiError;
use crate::state::AppState;
use crm_core::UserRole;

/// The caller, as described by a valid, unrevoked token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Allows the owner of `user_id`'s resources, or any admin.
    pub fn ensure_owner_or_admin(&self, user_id: i64) -> Result<(), ApiError> {
        if self.id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "You can only access your own resources",
            ))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let claims = state.jwt().validate(token)?;

        if state.blacklist().is_revoked(&claims.jti).await {
            tracing::debug!(jti = %claims.jti, "Rejected revoked token");
            return Err(AuthError::TokenRevoked.into());
        }

        Ok(AuthUser {
            id: claims.user_id()?,
            role: claims.role()?,
            expires_at: claims.expires_at(),
            email: claims.email,
            name: claims.name,
            jti: claims.jti,
        })
    }
}

/// An authenticated caller with the Admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::debug!(user_id = user.id, "Admin role required");
            return Err(ApiError::forbidden("Admin role required"));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn caller(id: i64, role: UserRole) -> AuthUser {
        AuthUser {
            id,
            email: "jane@example.com".to_string(),
            name: "Jane".to_string(),
            role,
            jti: "jti".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_allowed() {
        assert!(caller(7, UserRole::Regular).ensure_owner_or_admin(7).is_ok());
    }

    #[test]
    fn test_admin_allowed_for_anyone() {
        assert!(caller(1, UserRole::Admin).ensure_owner_or_admin(7).is_ok());
    }

    #[test]
    fn test_other_user_forbidden() {
        let err = caller(8, UserRole::Regular)
            .ensure_owner_or_admin(7)
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
