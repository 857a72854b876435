//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in crm-api                                │
//! │                                                                         │
//! │  Handler: async fn(...) -> Result<Json<T>, ApiError>                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ValidationError / CoreError ──► 400 / 404     (message passed through) │
//! │  AuthError                   ──► 401                                    │
//! │  DbError::NotFound           ──► 404                                    │
//! │  DbError::UniqueViolation    ──► 409                                    │
//! │  DbError::StockConflict      ──► 400                                    │
//! │  DbError (anything else)     ──► 500  (detail logged, generic message)  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  IntoResponse: status + {"code": "NOT_FOUND", "message": "..."}         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crm_core::{CoreError, ValidationError};
use crm_db::DbError;

/// Error body returned by every failing endpoint.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product with ID 42 not found"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock to satisfy a cart line or order (400)
    InsufficientStock,

    /// A business rule rejected the operation (400)
    BusinessRule,

    /// Missing, invalid or revoked credentials (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Duplicate or concurrently modified resource (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::InsufficientStock | ErrorCode::BusinessRule => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::StockConflict { product_id } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!("Not enough stock for product {}", product_id),
            ),
            DbError::ConcurrentUpdate { entity, id } => ApiError::conflict(format!(
                "{} {} was modified by another request, retry",
                entity, id
            )),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint violation: {}", message);
                ApiError::validation("Value out of range")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_)
            | CoreError::UserNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::CartItemNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidStatusTransition { .. } | CoreError::CartTooLarge { .. } => {
                ErrorCode::BusinessRule
            }
            CoreError::Validation(e) => return ApiError::from(e.clone()),
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::TokenRevoked | AuthError::InvalidCredentials => {
                ApiError::unauthorized(err.to_string())
            }
            AuthError::InvalidToken(reason) => {
                tracing::debug!(%reason, "Rejected token");
                ApiError::unauthorized("Invalid or expired token")
            }
            AuthError::TokenCreation(_) | AuthError::PasswordHash(_) => {
                tracing::error!(error = %err, "Authentication infrastructure failure");
                ApiError::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("User", 1).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_db_error_mapping() {
        let err = ApiError::from(DbError::not_found("Product", 7));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: 7");

        let err = ApiError::from(DbError::duplicate("email", "jane@example.com"));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = ApiError::from(DbError::StockConflict { product_id: 3 });
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_db_errors_are_generic() {
        let err = ApiError::from(DbError::QueryFailed("near \"SELEC\": syntax error".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_core_error_mapping() {
        let err = ApiError::from(CoreError::InsufficientStock {
            product_id: 1,
            name: "Widget".to_string(),
            available: 2,
            requested: 5,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.message,
            "Not enough stock for product Widget. Requested: 5, Available: 2"
        );

        let err = ApiError::from(CoreError::Validation(ValidationError::Required {
            field: "name".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "name is required");

        assert_eq!(
            ApiError::from(CoreError::CartItemNotFound(9)).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        let err = ApiError::from(AuthError::TokenRevoked);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Token has been invalidated");

        let err = ApiError::from(AuthError::InvalidToken("ExpiredSignature".to_string()));
        assert_eq!(err.message, "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_json_body() {
        let response = ApiError::not_found("Order", "abc").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Order not found: abc");
    }
}
