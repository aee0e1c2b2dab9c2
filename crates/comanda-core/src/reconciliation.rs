//! # Reconciliation Aggregator
//!
//! Turns the settled and voided orders of a shift into the closing totals.
//!
//! ## Accumulation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each order in scope (one pass, any order):                         │
//! │                                                                         │
//! │   VOIDED  ──► total_voided += total, voided_count += 1                  │
//! │                                                                         │
//! │   SETTLED ──► total_sales += final_total                                │
//! │           ├─► LOCAL    → total_local_sales                              │
//! │           ├─► DELIVERY → total_delivery_sales                           │
//! │           └─► tender:                                                   │
//! │                 Mixed(b)     → cash += b.cash, debit += b.debit, ...    │
//! │                 Single(kind) → kind += final_total                      │
//! │                 Unattributed → no tender                                │
//! │                                                                         │
//! │   PENDING ──► ignored                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every accumulator is a plain sum, so the result does not depend on the
//! order of the input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::order::Order;
use crate::shift::{ReportScope, Shift};
use crate::types::{Channel, OrderStatus, TenderKind};

// =============================================================================
// Snapshot
// =============================================================================

/// Closing totals of a shift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReconciliationSnapshot {
    pub cash: Money,
    pub debit: Money,
    pub transfer: Money,
    pub voucher: Money,
    pub total_sales: Money,
    pub total_local_sales: Money,
    pub total_delivery_sales: Money,
    pub total_voided: Money,
    pub voided_count: u32,
}

impl ReconciliationSnapshot {
    pub fn tender_total(&self, kind: TenderKind) -> Money {
        match kind {
            TenderKind::Cash => self.cash,
            TenderKind::Debit => self.debit,
            TenderKind::Transfer => self.transfer,
            TenderKind::Voucher => self.voucher,
        }
    }

    fn add_tender(&mut self, kind: TenderKind, amount: Money) {
        match kind {
            TenderKind::Cash => self.cash += amount,
            TenderKind::Debit => self.debit += amount,
            TenderKind::Transfer => self.transfer += amount,
            TenderKind::Voucher => self.voucher += amount,
        }
    }

    /// Cash that should be in the drawer: cash takings plus the float.
    pub fn expected_cash(&self, initial_float: Money) -> Money {
        self.cash + initial_float
    }

    pub fn is_empty(&self) -> bool {
        *self == ReconciliationSnapshot::default()
    }
}

/// Computes the snapshot for a set of orders. Pure.
pub fn aggregate<'a>(orders: impl IntoIterator<Item = &'a Order>) -> ReconciliationSnapshot {
    let mut snapshot = ReconciliationSnapshot::default();

    for order in orders {
        match order.status {
            OrderStatus::Voided => {
                snapshot.total_voided += order.reported_total();
                snapshot.voided_count += 1;
            }
            OrderStatus::Settled => {
                // A settled order always carries its charge; anything else
                // is left unattributed.
                let Some(charge) = order.charge.as_ref() else {
                    continue;
                };

                snapshot.total_sales += charge.final_total;
                match order.channel {
                    Channel::Local => snapshot.total_local_sales += charge.final_total,
                    Channel::Delivery => snapshot.total_delivery_sales += charge.final_total,
                }

                let allocation = charge.tender.allocate(charge.final_total);
                for kind in TenderKind::ALL {
                    snapshot.add_tender(kind, allocation.get(kind));
                }
            }
            OrderStatus::Pending => {}
        }
    }

    snapshot
}

// =============================================================================
// Scoping & Display
// =============================================================================

/// Whether an order reconciles into the window `[from, until)`.
///
/// Settled and voided orders only, placed by their closing timestamp.
pub fn in_window(order: &Order, from: DateTime<Utc>, until: DateTime<Utc>) -> bool {
    let ts = order.closing_timestamp();
    order.status.is_terminal() && ts >= from && ts < until
}

/// Most recent first, by closing timestamp. Ties fall back to folio number.
pub fn sort_for_display(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.closing_timestamp()
            .cmp(&a.closing_timestamp())
            .then_with(|| b.sequence_number.cmp(&a.sequence_number))
    });
}

// =============================================================================
// Close Confirmation
// =============================================================================

/// Totals shown to the operator before a close. Closing requires one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CloseConfirmation {
    pub shift_id: String,
    pub initial_float: Money,
    pub snapshot: ReconciliationSnapshot,
    /// `snapshot.cash + initial_float`.
    pub expected_cash: Money,
}

impl CloseConfirmation {
    /// Aggregates `orders` (the shift's scoped set) for confirmation.
    ///
    /// Fails with `InvalidState` when the shift is already closed.
    pub fn prepare<'a>(
        shift: &Shift,
        orders: impl IntoIterator<Item = &'a Order>,
    ) -> CoreResult<Self> {
        if !shift.is_open() {
            return Err(CoreError::invalid_state("Shift", &shift.id, shift.state));
        }

        let snapshot = aggregate(orders);
        Ok(CloseConfirmation {
            shift_id: shift.id.clone(),
            initial_float: shift.initial_float,
            expected_cash: snapshot.expected_cash(shift.initial_float),
            snapshot,
        })
    }

    /// Fails with `InvalidState` when the confirmation was computed for a
    /// different shift.
    pub fn check_issued_for(&self, shift: &Shift) -> CoreResult<()> {
        if self.shift_id != shift.id {
            return Err(CoreError::InvalidState {
                entity: "Close confirmation".to_string(),
                id: shift.id.clone(),
                current: format!("issued for shift {}", self.shift_id),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Shift Report
// =============================================================================

/// Everything the report renderer needs for one day or shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftReport {
    pub shift: Option<Shift>,
    /// Settled and voided orders, most recent first.
    pub orders: Vec<Order>,
    pub snapshot: ReconciliationSnapshot,
    /// Cash takings plus the float, when there is a shift.
    pub expected_cash: Money,
    /// Past day without a shift.
    pub no_movements: bool,
}

impl ShiftReport {
    /// Builds the report for a resolved scope from the orders in its window.
    pub fn build(scope: &ReportScope, mut orders: Vec<Order>) -> Self {
        if matches!(scope, ReportScope::NoMovements) {
            return ShiftReport {
                shift: None,
                orders: Vec::new(),
                snapshot: ReconciliationSnapshot::default(),
                expected_cash: Money::zero(),
                no_movements: true,
            };
        }

        orders.retain(|o| o.status.is_terminal());
        sort_for_display(&mut orders);

        let shift = scope.shift().cloned();
        let snapshot = aggregate(&orders);
        let float = shift.as_ref().map_or(Money::zero(), |s| s.initial_float);

        ShiftReport {
            expected_cash: snapshot.expected_cash(float),
            shift,
            orders,
            snapshot,
            no_movements: false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
