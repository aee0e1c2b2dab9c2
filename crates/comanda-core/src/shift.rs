//! # Shift (Till) Manager
//!
//! Rules for opening, scoping and closing a register shift.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open(float, operator)           close(confirmation)                   │
//! │  ──────────────────────► OPEN ─────────────────────────► CLOSED         │
//! │                           │        requires: no PENDING     (terminal)  │
//! │                           │        order anywhere                       │
//! │                           │                                             │
//! │                           └── orders whose closing timestamp falls in   │
//! │                               [opened_at, closed_at or now) belong here │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Non-atomic by construction
//! The store has no cross-document transactions. Two things are therefore
//! computed by scanning and can race:
//! - the folio number (`next_sequence_number`) may be handed out twice
//! - a PENDING order created between the outstanding-count check and the
//!   close write does not block the close
//!
//! Both are accepted behaviour. Nothing here adds locking to hide them.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::reconciliation::{CloseConfirmation, ReconciliationSnapshot};
use crate::types::Operator;
use crate::validation::{validate_initial_float, validate_required};

// =============================================================================
// Shift State
// =============================================================================

/// `Open` is initial, `Closed` is terminal. There is no reopening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftState {
    Open,
    Closed,
}

impl Default for ShiftState {
    fn default() -> Self {
        ShiftState::Open
    }
}

// =============================================================================
// Shift
// =============================================================================

/// One operating session of the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub initial_float: Money,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub state: ShiftState,
    pub opened_by: Operator,
    /// Set exactly once, at close.
    pub closing_totals: Option<ReconciliationSnapshot>,
    /// `closing_totals.cash + initial_float`, set at close.
    pub final_cash_float: Option<Money>,
}

impl Shift {
    pub fn is_open(&self) -> bool {
        self.state == ShiftState::Open
    }

    /// Reconciliation window: `[opened_at, closed_at or now)`.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.opened_at, self.closed_at.unwrap_or(now))
    }

    /// Whether `ts` falls inside this shift's window.
    pub fn contains(&self, ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let (from, until) = self.window(now);
        ts >= from && ts < until
    }

    /// Creation-time range scanned for folio numbers.
    ///
    /// Open shifts have no upper bound.
    pub fn sequence_window(&self) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        (self.opened_at, self.closed_at)
    }

    /// Checks the close preconditions without touching the shift.
    ///
    /// ## Rules
    /// - A closed shift cannot be closed again (`InvalidState`)
    /// - `outstanding` is the store-wide PENDING count, not this shift's;
    ///   any value above zero refuses the close (`OutstandingOrders`)
    pub fn check_closable(&self, outstanding: u64) -> CoreResult<()> {
        if !self.is_open() {
            return Err(CoreError::invalid_state("Shift", &self.id, self.state));
        }
        if outstanding > 0 {
            return Err(CoreError::OutstandingOrders { count: outstanding });
        }
        Ok(())
    }

    /// Closes the shift with the totals the operator confirmed.
    ///
    /// On any error the shift is left untouched.
    pub fn close(
        &mut self,
        confirmation: &CloseConfirmation,
        outstanding: u64,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.check_closable(outstanding)?;
        confirmation.check_issued_for(self)?;

        self.state = ShiftState::Closed;
        self.closed_at = Some(at);
        self.final_cash_float = Some(confirmation.expected_cash);
        self.closing_totals = Some(confirmation.snapshot.clone());
        Ok(())
    }
}

// =============================================================================
// Opening
// =============================================================================

/// Validated input for opening a shift. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftOpening {
    pub initial_float: Money,
    pub operator: Operator,
}

impl ShiftOpening {
    /// Validates the float and the operator identity.
    ///
    /// ## Errors
    /// - `Validation` when `initial_float < 0`
    /// - `Identity` when the identity provider yielded nobody, or a blank id
    ///
    /// No check for an already-open shift happens here. The "one OPEN shift"
    /// rule is a query convention of the caller.
    pub fn new(initial_float: Money, operator: Option<Operator>) -> CoreResult<Self> {
        validate_initial_float(initial_float)?;

        let operator = operator
            .ok_or_else(|| CoreError::Identity("no authenticated operator".to_string()))?;
        validate_required("user id", &operator.user_id)
            .map_err(|_| CoreError::Identity("operator has no user id".to_string()))?;

        Ok(ShiftOpening {
            initial_float,
            operator,
        })
    }

    /// Builds the shift the store persists.
    pub fn into_shift(self, id: String, opened_at: DateTime<Utc>) -> Shift {
        Shift {
            id,
            initial_float: self.initial_float,
            opened_at,
            closed_at: None,
            state: ShiftState::Open,
            opened_by: self.operator,
            closing_totals: None,
            final_cash_float: None,
        }
    }
}

// =============================================================================
// Folio Numbers
// =============================================================================

/// `max(existing) + 1`, or 1 when nothing was numbered yet.
///
/// Pure scan-and-increment. Two callers scanning the same set get the same
/// number.
///
/// ## Example
/// ```rust
/// use comanda_core::shift::next_sequence_number;
///
/// assert_eq!(next_sequence_number(Vec::new()), 1);
/// assert_eq!(next_sequence_number([3, 7, 5]), 8);
/// ```
pub fn next_sequence_number(existing: impl IntoIterator<Item = i64>) -> i64 {
    existing.into_iter().max().map_or(1, |max| max + 1)
}

// =============================================================================
// Calendar Days
// =============================================================================

/// UTC bounds `[start, end)` of a calendar day in the given offset.
pub fn day_window(date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc_midnight = local_midnight - Duration::seconds(offset.local_minus_utc() as i64);
    let start = Utc.from_utc_datetime(&utc_midnight);
    (start, start + Duration::days(1))
}

/// The calendar day `ts` falls on in the given offset.
pub fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

// =============================================================================
// Report Scope
// =============================================================================

/// Which orders a report for a given day covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportScope {
    /// A resolved shift; orders in its window.
    Shift(Shift),
    /// Today with no shift at all: the calendar-day window.
    Day {
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    },
    /// Past day without a shift. Shows "no movements", never loose orders.
    NoMovements,
}

impl ReportScope {
    /// Resolves the scope for a day.
    ///
    /// ## Resolution
    /// ```text
    /// today?  ── yes ──► OPEN shift ──► latest opened today ──► Day window
    ///    │
    ///    └─ no ──► latest opened that day ──► NoMovements
    /// ```
    pub fn resolve(
        is_today: bool,
        open_shift: Option<Shift>,
        latest_opened: Option<Shift>,
        day: (DateTime<Utc>, DateTime<Utc>),
    ) -> Self {
        if is_today {
            match open_shift.or(latest_opened) {
                Some(shift) => ReportScope::Shift(shift),
                None => ReportScope::Day {
                    from: day.0,
                    until: day.1,
                },
            }
        } else {
            latest_opened.map_or(ReportScope::NoMovements, ReportScope::Shift)
        }
    }

    /// Order window covered by this scope, `None` for `NoMovements`.
    pub fn window(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self {
            ReportScope::Shift(shift) => Some(shift.window(now)),
            ReportScope::Day { from, until } => Some((*from, *until)),
            ReportScope::NoMovements => None,
        }
    }

    pub fn shift(&self) -> Option<&Shift> {
        match self {
            ReportScope::Shift(shift) => Some(shift),
            _ => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
