//! # Money Module
//!
//! Provides the `Money` type for every amount the till handles.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Mixed payments must sum EXACTLY to the charge:                         │
//! │    cash 1000 + debit 800 == 1800   ✅ always true with integers         │
//! │    0.1 + 0.2 == 0.3                ❌ false with floats                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor currency units                             │
//! │    Pesos have no decimals, so 1 unit == $1.                             │
//! │    Currencies with cents store cents. The math is identical.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::money::Money;
//!
//! let price = Money::from_minor(1000);
//! let line = price * 2u32;
//! assert_eq!(line.minor(), 2000);
//!
//! // 10% off, rounded half-up to the nearest unit
//! assert_eq!(line.percentage(10).minor(), 200);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: a mismatch between tendered and owed can be negative
/// - **Single field tuple struct**: zero-cost wrapper, serialises as a plain number
///
/// ## Where Money Flows
/// ```text
/// MenuItem.price ──► LineItem.unit_price ──► running total
///                                              │
///                                   discount % ▼
///                                         final total ──► tender breakdown
///                                              │
///                                              ▼
///                                    reconciliation snapshot
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let price = Money::from_minor(4500);
    /// assert_eq!(price.minor(), 4500);
    /// ```
    #[inline]
    pub const fn from_minor(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `percent`% of this amount, rounded half-up to the nearest unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * percent + 50) / 100` on i128. Only meaningful
    /// for non-negative amounts, which is all the discount path ever sees.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// // 15% of 1990 = 298.5 → 299
    /// assert_eq!(Money::from_minor(1990).percentage(15).minor(), 299);
    /// ```
    pub fn percentage(&self, percent: u8) -> Money {
        let amount = (self.0 as i128 * percent as i128 + 50) / 100;
        Money::from_minor(amount as i64)
    }

    /// `max(0, self - other)`. Used wherever the UI fills in "what is left".
    #[inline]
    pub fn saturating_remainder(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented rendering with `.` thousands separators, e.g. `$12.500`.
///
/// ## Note
/// Receipts and reports use the configured currency format in the app layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        write!(f, "{}${}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
