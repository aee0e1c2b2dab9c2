//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Malformed input                                 │
//! │                                                                         │
//! │  comanda-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures (transport, conflicts)           │
//! │                                                                         │
//! │  Register API errors (in app)                                           │
//! │  └── ApiError         - What the operator sees (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError ← DbError                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recovery Rules
//! - `Validation`: re-prompt the operator, nothing was mutated
//! - `InvalidState`, `ShiftClosed`, `Identity`: fatal to the operation
//! - `AmountMismatch`: show the exact shortfall/excess, nothing persisted
//! - `OutstandingOrders`: close refused entirely

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Operation attempted against a terminal or wrong-state entity.
    ///
    /// ## When This Occurs
    /// - Settling or voiding an order that is no longer pending
    /// - Amending the payment of an order that was never settled
    /// - Closing a shift that is already closed
    #[error("{entity} {id} is {current}, cannot perform operation")]
    InvalidState {
        entity: String,
        id: String,
        current: String,
    },

    /// A mixed payment does not add up to the amount owed.
    ///
    /// `difference = expected - tendered`: positive is a shortfall,
    /// negative an excess.
    ///
    /// ## User Workflow
    /// ```text
    /// Final total: 1800
    /// Cash 1000 + Debit 700 = 1700
    ///      │
    ///      ▼
    /// AmountMismatch { expected: 1800, tendered: 1700, difference: 100 }
    ///      │
    ///      ▼
    /// UI shows: "Missing $100"
    /// ```
    #[error("Payment does not match total: expected {expected}, tendered {tendered} (difference {difference})")]
    AmountMismatch {
        expected: Money,
        tendered: Money,
        difference: Money,
    },

    /// Shift close blocked by orders still pending anywhere in the store.
    #[error("Cannot close shift: {count} order(s) still pending")]
    OutstandingOrders { count: u64 },

    /// The mutation needs an open shift and there is none.
    ///
    /// ## When This Occurs
    /// - Submitting a new order with no open shift
    /// - Amending a payment after the shift closed
    #[error("No open shift for this operation")]
    ShiftClosed,

    /// The operator identity could not be resolved.
    #[error("Operator identity unavailable: {0}")]
    Identity(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidState error.
    pub fn invalid_state(
        entity: impl Into<String>,
        id: impl Into<String>,
        current: impl std::fmt::Debug,
    ) -> Self {
        CoreError::InvalidState {
            entity: entity.into(),
            id: id.into(),
            current: format!("{:?}", current),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur before any business rule runs. No state is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be zero or more.
    #[error("{field} cannot be negative")]
    MustBeNonNegative { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., an unknown payment method name).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Order has no line items at submit/settlement time.
    #[error("Order has no items")]
    EmptyOrder,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
