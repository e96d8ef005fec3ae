//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow at the HTTP Boundary                      │
//! │                                                                         │
//! │  AuthError (bad signature)        → 401  no side effects               │
//! │  ValidationError / malformed body → 400  no side effects               │
//! │  NotFound (user/product)          → 404                                │
//! │  Persistence / provider failure   → 500  gateway redelivers; safe      │
//! │                                          under the idempotency key     │
//! │                                                                         │
//! │  NOT errors at this layer:                                             │
//! │  • duplicate event      → 200 {"outcome":"already_processed"}          │
//! │  • ignored event type   → 200 {"outcome":"ignored"}                    │
//! │  • unfulfillable payer  → 200 (logged as operator anomaly upstream)    │
//! │  • missing rate         → listed in "unresolved"/"incomplete"          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use bazaar_db::DbError;
use bazaar_settle::SettleError;

/// API error returned from HTTP handlers.
///
/// Serialized as:
/// ```json
/// { "code": "NOT_FOUND", "message": "User not found: u-123" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Webhook signature rejected (401)
    AuthError,

    /// Database operation failed (500)
    DatabaseError,

    /// External service failed (502/500)
    ExternalService,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// 404 helper.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self.code {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::AuthError => StatusCode::UNAUTHORIZED,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ExternalService => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            _ => ApiError::new(ErrorCode::DatabaseError, err.to_string()),
        }
    }
}

impl From<SettleError> for ApiError {
    fn from(err: SettleError) -> Self {
        match &err {
            SettleError::Auth(_) => ApiError::new(ErrorCode::AuthError, err.to_string()),
            SettleError::MalformedEvent(_) | SettleError::Validation(_) => {
                ApiError::new(ErrorCode::ValidationError, err.to_string())
            }
            SettleError::Provider(_) | SettleError::MalformedResponse(_) => {
                ApiError::new(ErrorCode::ExternalService, err.to_string())
            }
            SettleError::Persistence(db) => match db {
                DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
                _ => ApiError::new(ErrorCode::DatabaseError, err.to_string()),
            },
            _ => ApiError::new(ErrorCode::Internal, err.to_string()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::not_found("User not found: u1").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::new(ErrorCode::AuthError, "bad signature").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::new(ErrorCode::ValidationError, "amount must be positive").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_settle_error_conversion() {
        let err: ApiError = SettleError::Auth("mismatch".into()).into();
        assert_eq!(err.code, ErrorCode::AuthError);

        let err: ApiError = SettleError::MalformedEvent("bad json".into()).into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: ApiError = SettleError::Provider("timeout".into()).into();
        assert_eq!(err.code, ErrorCode::ExternalService);

        let err: ApiError = SettleError::Persistence(DbError::PoolExhausted).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_db_not_found_maps_to_404() {
        let err: ApiError = DbError::not_found("User", "u1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
