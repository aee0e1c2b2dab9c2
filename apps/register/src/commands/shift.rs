//! # Shift Commands
//!
//! ## Close Sequence
//! ```text
//! prepare_close(shift) ──► CloseConfirmation (totals shown to operator)
//!                                │
//!                         operator confirms
//!                                │
//! close_shift(shift, confirmation)
//!   ├── 1. count_outstanding()        global PENDING count
//!   └── 2. commit_close(.., count)    conditional write on the shift
//! ```
//!
//! Steps 1 and 2 are separate store calls. An order created between them
//! is not seen by the close.

use chrono::Utc;
use tracing::{debug, info, warn};

use comanda_core::shift::next_sequence_number as next_in_sequence;
use comanda_core::{CloseConfirmation, Money, Operator, Shift, ShiftOpening};
use comanda_db::Database;

use crate::error::ApiResult;

/// The OPEN shift, if any.
pub async fn current_shift(db: &Database) -> ApiResult<Option<Shift>> {
    Ok(db.shifts().find_open().await?)
}

/// Opens a shift.
///
/// `operator` is what the identity provider resolved; `None` fails with
/// an identity error. An already-open shift is not checked for.
pub async fn open_shift(
    db: &Database,
    initial_float: Money,
    operator: Option<Operator>,
) -> ApiResult<Shift> {
    debug!(initial_float = %initial_float, "open_shift command");

    let opening = ShiftOpening::new(initial_float, operator)?;
    let shift = db.shifts().open(opening).await?;

    let open_count = db.shifts().count_open().await?;
    if open_count > 1 {
        warn!(open_count, id = %shift.id, "More than one shift is open");
    }

    Ok(shift)
}

/// Folio number for the next order of `shift`: scan, then `max + 1`.
pub async fn next_sequence_number(db: &Database, shift: &Shift) -> ApiResult<i64> {
    let (from, until) = shift.sequence_window();
    let numbers = db.orders().sequence_numbers_between(from, until).await?;
    Ok(next_in_sequence(numbers))
}

/// Number of PENDING orders anywhere in the store.
pub async fn count_outstanding(db: &Database) -> ApiResult<u64> {
    Ok(db.orders().count_pending().await?)
}

/// Computes the totals the operator confirms before closing.
pub async fn prepare_close(db: &Database, shift: &Shift) -> ApiResult<CloseConfirmation> {
    let (from, until) = shift.window(Utc::now());
    let orders = db.orders().list_closed_between(from, until).await?;
    let confirmation = CloseConfirmation::prepare(shift, &orders)?;

    debug!(
        id = %shift.id,
        orders = orders.len(),
        total_sales = %confirmation.snapshot.total_sales,
        expected_cash = %confirmation.expected_cash,
        "Close prepared"
    );
    Ok(confirmation)
}

/// Second close step: applies the rules to an already-taken outstanding
/// count and writes the close.
pub async fn commit_close(
    db: &Database,
    shift: &Shift,
    confirmation: &CloseConfirmation,
    outstanding: u64,
) -> ApiResult<Shift> {
    let mut closing = shift.clone();
    if let Err(e) = closing.close(confirmation, outstanding, Utc::now()) {
        warn!(id = %shift.id, outstanding, error = %e, "Shift close refused");
        return Err(e.into());
    }

    let closed = db.shifts().save_close(confirmation).await?;
    info!(
        id = %closed.id,
        final_cash_float = ?closed.final_cash_float,
        "Shift close committed"
    );
    Ok(closed)
}

/// Closes `shift` with a confirmation from [`prepare_close`].
pub async fn close_shift(
    db: &Database,
    shift: &Shift,
    confirmation: &CloseConfirmation,
) -> ApiResult<Shift> {
    let outstanding = count_outstanding(db).await?;
    commit_close(db, shift, confirmation, outstanding).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::order::submit_order;
    use crate::commands::payment::settle_order;
    use crate::error::ErrorCode;
    use comanda_core::{Channel, MenuItem, OrderDraft, PaymentRequest, ShiftState, TenderKind};
    use comanda_db::DbConfig;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn cashier() -> Option<Operator> {
        Some(Operator::new("u-1", "caja@comanda.cl"))
    }

    fn roll() -> MenuItem {
        MenuItem {
            id: "roll".to_string(),
            name: "Acevichado Roll".to_string(),
            category: "Rolls".to_string(),
            price: Money::from_minor(1000),
            description: None,
        }
    }

    fn draft_with(qty: u32, shift: &Shift) -> OrderDraft {
        let mut draft = OrderDraft::new(Channel::Local);
        for _ in 0..qty {
            assert!(draft.add_item(&roll(), Some(shift)));
        }
        draft
    }

    #[tokio::test]
    async fn test_open_requires_operator_and_valid_float() {
        let db = setup().await;

        let err = open_shift(&db, Money::from_minor(20_000), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);

        let err = open_shift(&db, Money::from_minor(-1), cashier()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(current_shift(&db).await.unwrap().is_none());

        let shift = open_shift(&db, Money::from_minor(20_000), cashier()).await.unwrap();
        assert_eq!(current_shift(&db).await.unwrap().unwrap().id, shift.id);
    }

    #[tokio::test]
    async fn test_close_happy_path() {
        let db = setup().await;
        let shift = open_shift(&db, Money::from_minor(20_000), cashier()).await.unwrap();

        let order = submit_order(&db, &draft_with(2, &shift), Some(&shift)).await.unwrap();
        settle_order(&db, &order.id, &PaymentRequest::single(TenderKind::Cash).with_discount(10))
            .await
            .unwrap();

        let confirmation = prepare_close(&db, &shift).await.unwrap();
        assert_eq!(confirmation.snapshot.cash.minor(), 1800);
        assert_eq!(confirmation.expected_cash.minor(), 21_800);

        let closed = close_shift(&db, &shift, &confirmation).await.unwrap();
        assert_eq!(closed.state, ShiftState::Closed);
        assert_eq!(closed.final_cash_float, Some(Money::from_minor(21_800)));
        assert_eq!(closed.closing_totals.as_ref(), Some(&confirmation.snapshot));
        assert!(current_shift(&db).await.unwrap().is_none());

        // CLOSED is terminal.
        let err = close_shift(&db, &closed, &confirmation).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        let err = prepare_close(&db, &closed).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[tokio::test]
    async fn test_close_refused_while_anything_is_pending() {
        let db = setup().await;
        let shift = open_shift(&db, Money::zero(), cashier()).await.unwrap();

        submit_order(&db, &draft_with(1, &shift), Some(&shift)).await.unwrap();
        submit_order(&db, &draft_with(3, &shift), Some(&shift)).await.unwrap();

        let confirmation = prepare_close(&db, &shift).await.unwrap();
        let err = close_shift(&db, &shift, &confirmation).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OutstandingOrders);
        assert!(err.message.contains('2'));

        let still_open = current_shift(&db).await.unwrap().unwrap();
        assert_eq!(still_open, shift);
    }

    #[tokio::test]
    async fn test_order_created_between_close_steps_is_missed() {
        let db = setup().await;
        let shift = open_shift(&db, Money::zero(), cashier()).await.unwrap();
        let confirmation = prepare_close(&db, &shift).await.unwrap();

        // Step 1 sees a clean floor.
        let outstanding = count_outstanding(&db).await.unwrap();
        assert_eq!(outstanding, 0);

        // Another till sends an order before step 2.
        let late = submit_order(&db, &draft_with(1, &shift), Some(&shift)).await.unwrap();

        // Step 2 closes on the stale count.
        let closed = commit_close(&db, &shift, &confirmation, outstanding).await.unwrap();
        assert_eq!(closed.state, ShiftState::Closed);

        let pending = db.orders().list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, late.id);
    }

    #[tokio::test]
    async fn test_confirmation_for_another_shift_is_rejected() {
        let db = setup().await;
        let first = open_shift(&db, Money::zero(), cashier()).await.unwrap();
        let second = open_shift(&db, Money::zero(), cashier()).await.unwrap();

        let confirmation = prepare_close(&db, &first).await.unwrap();
        let err = close_shift(&db, &second, &confirmation).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[tokio::test]
    async fn test_folio_numbers_follow_the_shift() {
        let db = setup().await;
        let shift = open_shift(&db, Money::zero(), cashier()).await.unwrap();

        assert_eq!(next_sequence_number(&db, &shift).await.unwrap(), 1);
        let first = submit_order(&db, &draft_with(1, &shift), Some(&shift)).await.unwrap();
        let second = submit_order(&db, &draft_with(1, &shift), Some(&shift)).await.unwrap();

        assert_eq!(first.sequence_number, 1);
        assert_eq!(second.sequence_number, 2);
        assert_eq!(next_sequence_number(&db, &shift).await.unwrap(), 3);
    }
}
