//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Store failure? ──── DbError::QueryFailed("...") ─────┐                 │
//! │         │                                             │                 │
//! │         ▼                                             ▼                 │
//! │  Rule broken? ────── CoreError::AmountMismatch ──── ApiError ──► caller │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ──────────────────────────────────────────────────────► caller │
//! │                                                                         │
//! │  { "code": "AMOUNT_MISMATCH", "message": "Missing $100" }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store failures are logged in full and surfaced generically. Nothing is
//! retried: the operator re-triggers the action.

use serde::Serialize;

use comanda_core::{CoreError, ValidationError};
use comanda_db::DbError;

/// Error returned from register commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "OUTSTANDING_ORDERS",
///   "message": "Cannot close shift: 2 order(s) still pending"
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

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Entity is in a terminal or wrong state
    InvalidState,

    /// Mixed payment does not add up
    AmountMismatch,

    /// Close refused, orders still pending
    OutstandingOrders,

    /// No open shift for the operation
    ShiftClosed,

    /// Operator identity unavailable
    Unauthenticated,

    /// Another till changed the document first
    Conflict,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

/// Result type for register commands.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::Conflict {
                entity,
                id,
                expected,
            } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} {} is no longer {}", entity, id, expected),
            ),
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Json(e) => {
                tracing::error!("Stored document unreadable: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Stored document is unreadable")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidState { .. } => ApiError::new(ErrorCode::InvalidState, err.to_string()),
            CoreError::AmountMismatch { difference, .. } => {
                let message = if difference.is_positive() {
                    format!("Missing {}", difference)
                } else {
                    format!("Excess of {}", difference.abs())
                };
                ApiError::new(ErrorCode::AmountMismatch, message)
            }
            CoreError::OutstandingOrders { .. } => {
                ApiError::new(ErrorCode::OutstandingOrders, err.to_string())
            }
            CoreError::ShiftClosed => ApiError::new(ErrorCode::ShiftClosed, err.to_string()),
            CoreError::Identity(_) => ApiError::new(ErrorCode::Unauthenticated, err.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
