//! # Report Commands
//!
//! ## Scope Resolution
//! ```text
//! report(date)
//!   │
//!   ├── today ──► OPEN shift
//!   │               └─ none ──► latest shift opened today
//!   │                             └─ none ──► today's calendar window
//!   │
//!   └── past  ──► latest shift opened that day
//!                   └─ none ──► "no movements"
//! ```
//!
//! Calendar days use the register's configured UTC offset.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use comanda_core::shift::{day_window, local_date};
use comanda_core::{ReportScope, ShiftReport};
use comanda_db::Database;

use crate::config::RegisterConfig;
use crate::error::ApiResult;

/// Report for `date` (today when `None`).
pub async fn shift_report(
    db: &Database,
    config: &RegisterConfig,
    date: Option<NaiveDate>,
) -> ApiResult<ShiftReport> {
    report_at(db, config, date, Utc::now()).await
}

async fn report_at(
    db: &Database,
    config: &RegisterConfig,
    date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> ApiResult<ShiftReport> {
    let offset = config.utc_offset();
    let today = local_date(now, offset);
    let date = date.unwrap_or(today);
    let is_today = date == today;
    let day = day_window(date, offset);

    let open_shift = if is_today {
        db.shifts().find_open().await?
    } else {
        None
    };
    let latest_opened = db.shifts().latest_opened_between(day.0, day.1).await?;

    let scope = ReportScope::resolve(is_today, open_shift, latest_opened, day);
    let orders = match scope.window(now) {
        Some((from, until)) => db.orders().list_closed_between(from, until).await?,
        None => Vec::new(),
    };

    debug!(
        date = %date,
        shift = ?scope.shift().map(|s| s.id.as_str()),
        orders = orders.len(),
        "Report scope resolved"
    );
    Ok(ShiftReport::build(&scope, orders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::order::{submit_order, void_order};
    use crate::commands::payment::settle_order;
    use crate::commands::shift::{close_shift, open_shift, prepare_close};
    use chrono::Duration;
    use comanda_core::{Channel, MenuItem, Money, Operator, OrderDraft, PaymentRequest, TenderKind};
    use comanda_db::DbConfig;

    fn item(price: i64) -> MenuItem {
        MenuItem {
            id: format!("p{}", price),
            name: "Roll".to_string(),
            category: "Rolls".to_string(),
            price: Money::from_minor(price),
            description: None,
        }
    }

    fn cashier() -> Option<Operator> {
        Some(Operator::new("u-1", "caja@comanda.cl"))
    }

    #[tokio::test]
    async fn test_today_with_open_shift() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = RegisterConfig::default();
        let shift = open_shift(&db, Money::from_minor(20_000), cashier()).await.unwrap();

        let mut local = OrderDraft::new(Channel::Local);
        local.add_item(&item(1800), Some(&shift));
        let local = submit_order(&db, &local, Some(&shift)).await.unwrap();
        settle_order(&db, &local.id, &PaymentRequest::single(TenderKind::Cash))
            .await
            .unwrap();

        let mut delivery = OrderDraft::new(Channel::Delivery);
        delivery.add_item(&item(5000), Some(&shift));
        let delivery = submit_order(&db, &delivery, Some(&shift)).await.unwrap();
        settle_order(&db, &delivery.id, &PaymentRequest::single(TenderKind::Debit))
            .await
            .unwrap();

        let mut voided = OrderDraft::new(Channel::Local);
        voided.add_item(&item(3000), Some(&shift));
        let voided = submit_order(&db, &voided, Some(&shift)).await.unwrap();
        void_order(&db, &voided.id).await.unwrap();

        let report = shift_report(&db, &config, None).await.unwrap();
        assert!(!report.no_movements);
        assert_eq!(report.shift.as_ref().map(|s| s.id.as_str()), Some(shift.id.as_str()));
        assert_eq!(report.orders.len(), 3);
        assert_eq!(report.orders[0].id, voided.id);
        assert_eq!(report.snapshot.total_sales.minor(), 6800);
        assert_eq!(report.snapshot.total_local_sales.minor(), 1800);
        assert_eq!(report.snapshot.total_delivery_sales.minor(), 5000);
        assert_eq!(report.snapshot.cash.minor(), 1800);
        assert_eq!(report.snapshot.debit.minor(), 5000);
        assert_eq!(report.snapshot.total_voided.minor(), 3000);
        assert_eq!(report.snapshot.voided_count, 1);
        assert_eq!(report.expected_cash.minor(), 21_800);
    }

    #[tokio::test]
    async fn test_mixed_without_breakdown_still_reports_and_closes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = RegisterConfig::default();
        let shift = open_shift(&db, Money::from_minor(20_000), cashier()).await.unwrap();

        let mut draft = OrderDraft::new(Channel::Delivery);
        draft.add_item(&item(2500), Some(&shift));
        let order = submit_order(&db, &draft, Some(&shift)).await.unwrap();
        settle_order(&db, &order.id, &PaymentRequest::single(TenderKind::Cash))
            .await
            .unwrap();
        sqlx::query(
            "UPDATE orders SET payment_method = 'mixed', payment_breakdown = NULL WHERE id = ?1",
        )
        .bind(&order.id)
        .execute(db.pool())
        .await
        .unwrap();

        let report = shift_report(&db, &config, None).await.unwrap();
        assert_eq!(report.snapshot.total_sales.minor(), 2500);
        assert_eq!(report.snapshot.total_delivery_sales.minor(), 2500);
        assert_eq!(report.snapshot.cash.minor(), 0);
        assert_eq!(report.expected_cash.minor(), 20_000);

        let confirmation = prepare_close(&db, &shift).await.unwrap();
        let closed = close_shift(&db, &shift, &confirmation).await.unwrap();
        assert!(!closed.is_open());
    }

    #[tokio::test]
    async fn test_today_after_close_uses_latest_shift() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = RegisterConfig::default();
        let shift = open_shift(&db, Money::from_minor(1000), cashier()).await.unwrap();
        let confirmation = prepare_close(&db, &shift).await.unwrap();
        close_shift(&db, &shift, &confirmation).await.unwrap();

        let report = shift_report(&db, &config, None).await.unwrap();
        let reported = report.shift.unwrap();
        assert_eq!(reported.id, shift.id);
        assert!(!reported.is_open());
        assert_eq!(report.expected_cash.minor(), 1000);
    }

    #[tokio::test]
    async fn test_today_without_shift_uses_day_window() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = RegisterConfig::default();

        let report = shift_report(&db, &config, None).await.unwrap();
        assert!(report.shift.is_none());
        assert!(!report.no_movements);
        assert!(report.orders.is_empty());
    }

    #[tokio::test]
    async fn test_past_day_without_shift_has_no_movements() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = RegisterConfig::default();
        open_shift(&db, Money::zero(), cashier()).await.unwrap();

        let now = Utc::now();
        let yesterday = local_date(now, config.utc_offset()) - Duration::days(1);
        let report = report_at(&db, &config, Some(yesterday), now).await.unwrap();

        assert!(report.no_movements);
        assert!(report.shift.is_none());
        assert!(report.orders.is_empty());
    }
}
