//! # Validation Module
//!
//! Input validation for everything the operator types at the till.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register command (Rust)                                       │
//! │  ├── Type validation (deserialization, argument parsing)                │
//! │  └── THIS MODULE: field rules (float, discount, notes)                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Domain operations (order / settlement / shift)                │
//! │  └── State rules (PENDING only, shift OPEN, sums match)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (SQLite)                                                │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  └── Conditional updates (WHERE status = ...)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::validation::{validate_discount_percent, validate_initial_float};
//! use comanda_core::Money;
//!
//! validate_initial_float(Money::from_minor(20000)).unwrap();
//! assert_eq!(validate_discount_percent(10).unwrap(), 10u8);
//! assert!(validate_discount_percent(101).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_DISCOUNT_PERCENT, MAX_NOTE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the cash float entered when opening a shift.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (till opened without change)
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_initial_float;
/// use comanda_core::Money;
///
/// assert!(validate_initial_float(Money::from_minor(0)).is_ok());
/// assert!(validate_initial_float(Money::from_minor(-1)).is_err());
/// ```
pub fn validate_initial_float(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "initial float".to_string(),
        });
    }

    Ok(())
}

/// Validates a discount percentage and narrows it to `u8`.
///
/// ## Rules
/// - Must be between 0 and 100 inclusive
///
/// ## Note
/// Settlement rejects out-of-range input here. The pure preview
/// (`compute_discounted_total`) clamps instead.
pub fn validate_discount_percent(percent: i64) -> ValidationResult<u8> {
    if !(0..=MAX_DISCOUNT_PERCENT as i64).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount percent".to_string(),
            min: 0,
            max: MAX_DISCOUNT_PERCENT as i64,
        });
    }

    Ok(percent as u8)
}

/// Validates a catalog price.
///
/// ## Rules
/// - Must be non-negative; zero is allowed (complimentary items)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates the amounts of a payment breakdown.
///
/// Each tender amount must be zero or more. The sum rule lives in settlement.
pub fn validate_tender_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a free-text note (line item note or general order note).
///
/// ## Rules
/// - Can be empty
/// - At most `MAX_NOTE_LENGTH` characters (counted as chars, not bytes)
///
/// ## Returns
/// The trimmed note.
pub fn validate_note(field: &str, note: &str) -> ValidationResult<String> {
    let note = note.trim();

    if note.chars().count() > MAX_NOTE_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTE_LENGTH,
        });
    }

    Ok(note.to_string())
}

/// Validates that an identity field is present.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
