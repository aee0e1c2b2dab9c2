//! # Payment Settlement Engine
//!
//! Computes the final charge of an order and validates how it was tendered.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  running total ──► compute_discounted_total(total, %) ──► final total   │
//! │                                                              │          │
//! │  method + breakdown ──────────────► resolve_tender ◄─────────┘          │
//! │                                          │                              │
//! │          ┌───────────────────────────────┼──────────────────────┐       │
//! │          ▼                               ▼                      ▼       │
//! │   CASH/DEBIT/...               MIXED, sum == final       MIXED, sum ≠   │
//! │   Single(kind)                  │                        AmountMismatch │
//! │                                 ├── 1 non-zero ──► Single(kind)         │
//! │                                 └── 2+ non-zero ─► Mixed(breakdown)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same `compute_discounted_total` is used for previews and commits, so
//! the amount shown to the operator is the amount stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::order::{Order, SettledCharge};
use crate::shift::Shift;
use crate::types::{OrderStatus, PaymentBreakdown, PaymentMethod, Tender, TenderKind};
use crate::validation::{validate_discount_percent, validate_tender_amount};
use crate::MAX_DISCOUNT_PERCENT;

// =============================================================================
// Discount
// =============================================================================

/// `total − round_half_up(total × percent / 100)`, percent clamped to 0..=100.
///
/// ## Example
/// ```rust
/// use comanda_core::settlement::compute_discounted_total;
/// use comanda_core::Money;
///
/// assert_eq!(compute_discounted_total(Money::from_minor(2000), 10).minor(), 1800);
/// assert_eq!(compute_discounted_total(Money::from_minor(2000), 0).minor(), 2000);
/// assert_eq!(compute_discounted_total(Money::from_minor(2000), 250).minor(), 0);
/// ```
pub fn compute_discounted_total(running_total: Money, discount_percent: i64) -> Money {
    let percent = discount_percent.clamp(0, MAX_DISCOUNT_PERCENT as i64) as u8;
    running_total - running_total.percentage(percent)
}

// =============================================================================
// Payment Request
// =============================================================================

/// What the operator submitted at the payment screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    /// Only read when `method` is `Mixed`.
    #[serde(default)]
    pub breakdown: Option<PaymentBreakdown>,
    #[serde(default)]
    pub discount_percent: i64,
}

impl PaymentRequest {
    /// A single-method payment without discount.
    pub fn single(kind: TenderKind) -> Self {
        PaymentRequest {
            method: PaymentMethod::from(kind),
            breakdown: None,
            discount_percent: 0,
        }
    }

    pub fn mixed(breakdown: PaymentBreakdown) -> Self {
        PaymentRequest {
            method: PaymentMethod::Mixed,
            breakdown: Some(breakdown),
            discount_percent: 0,
        }
    }

    pub fn with_discount(mut self, percent: i64) -> Self {
        self.discount_percent = percent;
        self
    }
}

// =============================================================================
// Tender Resolution
// =============================================================================

/// Turns a method and optional breakdown into a stored tender for `target`.
///
/// ## Rules
/// - Non-mixed methods attribute the whole target to that kind; any
///   breakdown is ignored
/// - Mixed: every amount must be `>= 0` and the four must sum to `target`
///   exactly, else `AmountMismatch` with `difference = target − sum`
/// - Zero entries are dropped. One survivor collapses to `Single`
/// - A mixed payment with no non-zero entry is rejected
pub fn resolve_tender(
    method: PaymentMethod,
    breakdown: Option<&PaymentBreakdown>,
    target: Money,
) -> CoreResult<Tender> {
    if let Some(kind) = method.tender_kind() {
        return Ok(Tender::Single(kind));
    }

    let breakdown = breakdown.copied().unwrap_or_default();
    for kind in TenderKind::ALL {
        validate_tender_amount(&format!("{:?} amount", kind).to_lowercase(), breakdown.get(kind))?;
    }

    let tendered = breakdown.total();
    if tendered != target {
        return Err(CoreError::AmountMismatch {
            expected: target,
            tendered,
            difference: target - tendered,
        });
    }

    match breakdown.non_zero_kinds().as_slice() {
        [] => Err(ValidationError::Required {
            field: "payment breakdown".to_string(),
        }
        .into()),
        [single] => Ok(Tender::Single(*single)),
        _ => Ok(Tender::Mixed(breakdown)),
    }
}

// =============================================================================
// Order Settlement
// =============================================================================

impl Order {
    /// Computes the charge a settlement would store, without mutating.
    ///
    /// ## Errors
    /// - `InvalidState` when the order is not PENDING
    /// - `Validation(EmptyOrder)` when there is nothing to charge
    /// - `Validation(OutOfRange)` for a discount outside 0..=100
    /// - `AmountMismatch` when a mixed breakdown misses the final total
    pub fn prepare_settlement(&self, request: &PaymentRequest) -> CoreResult<SettledCharge> {
        self.ensure_pending()?;
        if self.line_items.is_empty() {
            return Err(ValidationError::EmptyOrder.into());
        }

        let discount_percent = validate_discount_percent(request.discount_percent)?;
        let original_total = self.running_total();
        let final_total = compute_discounted_total(original_total, discount_percent as i64);
        let tender = resolve_tender(request.method, request.breakdown.as_ref(), final_total)?;

        Ok(SettledCharge {
            original_total,
            discount_percent,
            final_total,
            tender,
        })
    }

    /// PENDING → SETTLED. On error the order is untouched.
    pub fn settle(&mut self, request: &PaymentRequest, at: DateTime<Utc>) -> CoreResult<()> {
        let charge = self.prepare_settlement(request)?;
        self.apply_settlement(charge, at);
        Ok(())
    }

    fn apply_settlement(&mut self, charge: SettledCharge, at: DateTime<Utc>) {
        self.total = charge.original_total;
        self.status = OrderStatus::Settled;
        self.settled_at = Some(at);
        self.charge = Some(charge);
    }

    /// Validates a change of tender on a settled order.
    ///
    /// The amount owed never changes: the new tender is checked against the
    /// existing final total.
    ///
    /// ## Errors
    /// - `ShiftClosed` unless `active_shift` is OPEN and the order falls in it
    /// - `InvalidState` when the order was never settled
    /// - `AmountMismatch` as for settlement
    pub fn prepare_payment_amendment(
        &self,
        method: PaymentMethod,
        breakdown: Option<&PaymentBreakdown>,
        active_shift: Option<&Shift>,
    ) -> CoreResult<Tender> {
        let owned_by_open_shift = active_shift
            .map_or(false, |s| s.is_open() && self.closing_timestamp() >= s.opened_at);
        if !owned_by_open_shift {
            return Err(CoreError::ShiftClosed);
        }

        let charge = match (&self.status, &self.charge) {
            (OrderStatus::Settled, Some(charge)) => charge,
            _ => return Err(CoreError::invalid_state("Order", &self.id, self.status)),
        };

        resolve_tender(method, breakdown, charge.final_total)
    }

    /// Replaces how a settled order was tendered.
    pub fn amend_payment(
        &mut self,
        method: PaymentMethod,
        breakdown: Option<&PaymentBreakdown>,
        active_shift: Option<&Shift>,
    ) -> CoreResult<()> {
        let tender = self.prepare_payment_amendment(method, breakdown, active_shift)?;
        if let Some(charge) = self.charge.as_mut() {
            charge.tender = tender;
        }
        Ok(())
    }
}

// =============================================================================
// Mixed Entry
// =============================================================================

/// Operator-side state of a mixed payment being typed in.
///
/// ## Auto-fill
/// ```text
/// 2 kinds active:  edit(cash, 1000) with target 1800 → debit = 800
/// 3+ kinds active: no auto-fill; fill_remainder(kind) on request
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MixedEntry {
    pub target: Money,
    /// Active kinds in the order they were switched on.
    pub active: Vec<TenderKind>,
    pub amounts: PaymentBreakdown,
}

impl MixedEntry {
    pub fn new(target: Money) -> Self {
        MixedEntry {
            target,
            active: Vec::new(),
            amounts: PaymentBreakdown::default(),
        }
    }

    /// Resumes editing a stored breakdown; non-zero kinds start active.
    pub fn from_breakdown(target: Money, breakdown: &PaymentBreakdown) -> Self {
        MixedEntry {
            target,
            active: breakdown.non_zero_kinds(),
            amounts: *breakdown,
        }
    }

    pub fn is_active(&self, kind: TenderKind) -> bool {
        self.active.contains(&kind)
    }

    /// Switches a kind on or off. Switching off zeroes its amount.
    ///
    /// Returns whether the kind is now active.
    pub fn toggle(&mut self, kind: TenderKind) -> bool {
        if self.is_active(kind) {
            self.active.retain(|k| *k != kind);
            self.amounts.set(kind, Money::zero());
            false
        } else {
            self.active.push(kind);
            true
        }
    }

    /// Sets the amount for `kind`. Negative input is taken as zero.
    ///
    /// With exactly two kinds active, the other one becomes
    /// `max(0, target − value)`.
    pub fn edit(&mut self, kind: TenderKind, value: Money) {
        let value = value.max(Money::zero());
        self.amounts.set(kind, value);

        if let [a, b] = self.active.as_slice() {
            let other = if *a == kind {
                Some(*b)
            } else if *b == kind {
                Some(*a)
            } else {
                None
            };
            if let Some(other) = other {
                self.amounts.set(other, self.target.saturating_remainder(value));
            }
        }
    }

    /// Sets `kind` to `max(0, target − sum of the other active kinds)`.
    pub fn fill_remainder(&mut self, kind: TenderKind) {
        let others: Money = self
            .active
            .iter()
            .filter(|k| **k != kind)
            .map(|k| self.amounts.get(*k))
            .sum();
        self.amounts.set(kind, self.target.saturating_remainder(others));
    }

    /// Sum over the active kinds.
    pub fn tendered(&self) -> Money {
        self.active.iter().map(|k| self.amounts.get(*k)).sum()
    }

    /// `target − tendered`: positive is still missing, negative is excess.
    pub fn remaining(&self) -> Money {
        self.target - self.tendered()
    }

    /// The breakdown to submit, holding only the active kinds.
    pub fn to_breakdown(&self) -> PaymentBreakdown {
        PaymentBreakdown::from_pairs(self.active.iter().map(|k| (*k, self.amounts.get(*k))))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
