//! # Order Repository
//!
//! The `orders` collection: inserts, single-document updates, range
//! queries, and the live pending-order feed.
//!
//! ## Write Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create            INSERT, server created_at, status = 'pending'        │
//! │  amend             UPDATE ... WHERE status = 'pending'                  │
//! │  save_settlement   UPDATE ... WHERE status = 'pending' AND total = ...  │
//! │  save_void         UPDATE ... WHERE status = 'pending'  (+ voided_at)   │
//! │  save_tender       UPDATE ... WHERE status = 'settled'                  │
//! │                                                                         │
//! │  0 rows affected ──► NotFound (no such id) or Conflict (state moved)    │
//! │  every successful write ──► wakes pending-order subscriptions           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each write touches one document. There are no multi-document
//! transactions: callers that check-then-write (folio numbers, shift close)
//! do so in separate steps.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteQueryResult;
use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use comanda_core::order::{NewOrder, OrderAmendment};
use comanda_core::reconciliation::in_window;
use comanda_core::{
    Channel, LineItem, Money, Order, OrderStatus, PaymentBreakdown, PaymentMethod,
    SettledCharge, Tender,
};

use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = r#"
    id, sequence_number, channel, table_label, line_items, general_note,
    status, total, created_at, settled_at, voided_at,
    original_total, discount_percent, final_total, payment_method, payment_breakdown
"#;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    sequence_number: i64,
    channel: Channel,
    table_label: String,
    line_items: String,
    general_note: String,
    status: OrderStatus,
    total: i64,
    created_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
    voided_at: Option<DateTime<Utc>>,
    original_total: Option<i64>,
    discount_percent: Option<i64>,
    final_total: Option<i64>,
    payment_method: Option<PaymentMethod>,
    payment_breakdown: Option<String>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        let line_items: Vec<LineItem> = serde_json::from_str(&row.line_items)?;

        let charge = match (
            row.original_total,
            row.discount_percent,
            row.final_total,
            row.payment_method,
        ) {
            (Some(original_total), Some(discount_percent), Some(final_total), Some(method)) => {
                let tender = match (method.tender_kind(), row.payment_breakdown.as_deref()) {
                    (Some(kind), _) => Tender::Single(kind),
                    (None, Some(json)) => {
                        Tender::Mixed(serde_json::from_str::<PaymentBreakdown>(json)?)
                    }
                    (None, None) => {
                        warn!(id = %row.id, "Order paid MIXED without a breakdown");
                        Tender::Unattributed
                    }
                };
                let discount_percent = u8::try_from(discount_percent).map_err(|_| {
                    DbError::Internal(format!(
                        "order {} has discount {}",
                        row.id, discount_percent
                    ))
                })?;
                Some(SettledCharge {
                    original_total: Money::from_minor(original_total),
                    discount_percent,
                    final_total: Money::from_minor(final_total),
                    tender,
                })
            }
            _ => None,
        };

        Ok(Order {
            id: row.id,
            sequence_number: row.sequence_number,
            channel: row.channel,
            table_label: row.table_label,
            line_items,
            general_note: row.general_note,
            status: row.status,
            total: Money::from_minor(row.total),
            created_at: row.created_at,
            settled_at: row.settled_at,
            voided_at: row.voided_at,
            charge,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

fn encode_breakdown(tender: &Tender) -> DbResult<Option<String>> {
    Ok(tender.breakdown().map(serde_json::to_string).transpose()?)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the `orders` collection.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    changes: Arc<watch::Sender<u64>>,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool, changes: Arc<watch::Sender<u64>>) -> Self {
        OrderRepository { pool, changes }
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Order::try_from).transpose()
    }

    /// Gets an order that must exist.
    pub async fn fetch(&self, id: &str) -> DbResult<Order> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// All PENDING orders in the store, oldest first.
    pub async fn list_pending(&self) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM orders WHERE status = 'pending' ORDER BY created_at ASC",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed pending orders");
        into_orders(rows)
    }

    /// Number of PENDING orders anywhere in the store, not per shift.
    pub async fn count_pending(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    /// Folio numbers of orders created in `[from, until)`; `until = None`
    /// leaves the range open.
    pub async fn sequence_numbers_between(
        &self,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<i64>> {
        let numbers: Vec<i64> = match until {
            Some(until) => {
                sqlx::query_scalar(
                    "SELECT sequence_number FROM orders WHERE created_at >= ?1 AND created_at < ?2",
                )
                .bind(from)
                .bind(until)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT sequence_number FROM orders WHERE created_at >= ?1")
                    .bind(from)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = numbers.len(), from = %from, "Scanned folio numbers");
        Ok(numbers)
    }

    /// SETTLED and VOIDED orders whose closing timestamp
    /// (`settled_at`, else `voided_at`, else `created_at`) is in
    /// `[from, until)`, most recent first.
    pub async fn list_closed_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM orders
            WHERE status IN ('settled', 'voided')
              AND COALESCE(settled_at, voided_at, created_at) >= ?1
              AND COALESCE(settled_at, voided_at, created_at) < ?2
            ORDER BY COALESCE(settled_at, voided_at, created_at) DESC
            "#,
            ORDER_COLUMNS
        ))
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = into_orders(rows)?;
        orders.retain(|order| in_window(order, from, until));

        debug!(count = orders.len(), from = %from, until = %until, "Listed closed orders");
        Ok(orders)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Inserts a new PENDING order. Id and `created_at` are assigned here.
    pub async fn create(&self, new: &NewOrder, sequence_number: i64) -> DbResult<Order> {
        let order = Order {
            id: Uuid::new_v4().to_string(),
            sequence_number,
            channel: new.channel,
            table_label: new.table_label.clone(),
            line_items: new.line_items.clone(),
            general_note: new.general_note.clone(),
            status: OrderStatus::Pending,
            total: new.total,
            created_at: Utc::now(),
            settled_at: None,
            voided_at: None,
            charge: None,
        };

        debug!(id = %order.id, sequence_number, total = %order.total, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, sequence_number, channel, table_label, line_items,
                general_note, status, total, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(order.sequence_number)
        .bind(order.channel)
        .bind(&order.table_label)
        .bind(serde_json::to_string(&order.line_items)?)
        .bind(&order.general_note)
        .bind(order.status)
        .bind(order.total.minor())
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        self.notify();
        Ok(order)
    }

    /// Replaces the content of a still-PENDING order. Folio number and
    /// `created_at` are left alone.
    pub async fn amend(&self, amendment: &OrderAmendment) -> DbResult<Order> {
        debug!(id = %amendment.order_id, total = %amendment.total, "Amending order");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                channel = ?2,
                table_label = ?3,
                line_items = ?4,
                general_note = ?5,
                total = ?6
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(&amendment.order_id)
        .bind(amendment.channel)
        .bind(&amendment.table_label)
        .bind(serde_json::to_string(&amendment.line_items)?)
        .bind(&amendment.general_note)
        .bind(amendment.total.minor())
        .execute(&self.pool)
        .await?;

        self.finish_write(result, &amendment.order_id, "pending").await
    }

    /// Records a settlement computed by the settlement engine.
    ///
    /// Only applies while the order is PENDING and its stored running total
    /// still equals the charge's `original_total`. An order amended after
    /// the charge was computed gives `Conflict`.
    pub async fn save_settlement(&self, order_id: &str, charge: &SettledCharge) -> DbResult<Order> {
        let now = Utc::now();
        debug!(
            id = %order_id,
            final_total = %charge.final_total,
            method = %charge.tender.method(),
            "Saving settlement"
        );

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'settled',
                settled_at = ?2,
                total = ?3,
                original_total = ?3,
                discount_percent = ?4,
                final_total = ?5,
                payment_method = ?6,
                payment_breakdown = ?7
            WHERE id = ?1 AND status = 'pending' AND total = ?3
            "#,
        )
        .bind(order_id)
        .bind(now)
        .bind(charge.original_total.minor())
        .bind(charge.discount_percent as i64)
        .bind(charge.final_total.minor())
        .bind(charge.tender.method())
        .bind(encode_breakdown(&charge.tender)?)
        .execute(&self.pool)
        .await?;

        self.finish_write(result, order_id, "pending at the charged total").await
    }

    /// Replaces the tender of a SETTLED order. Amounts are not touched.
    pub async fn save_tender(&self, order_id: &str, tender: &Tender) -> DbResult<Order> {
        debug!(id = %order_id, method = %tender.method(), "Saving amended tender");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                payment_method = ?2,
                payment_breakdown = ?3
            WHERE id = ?1 AND status = 'settled'
            "#,
        )
        .bind(order_id)
        .bind(tender.method())
        .bind(encode_breakdown(tender)?)
        .execute(&self.pool)
        .await?;

        self.finish_write(result, order_id, "settled").await
    }

    /// PENDING → VOIDED with a server `voided_at`.
    pub async fn save_void(&self, order_id: &str) -> DbResult<Order> {
        let now = Utc::now();
        debug!(id = %order_id, "Voiding order");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'voided',
                voided_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.finish_write(result, order_id, "pending").await
    }

    /// Maps "nothing updated" to NotFound/Conflict, otherwise notifies
    /// subscribers and returns the fresh document.
    async fn finish_write(
        &self,
        result: SqliteQueryResult,
        order_id: &str,
        expected: &str,
    ) -> DbResult<Order> {
        if result.rows_affected() == 0 {
            return match self.get_by_id(order_id).await? {
                Some(_) => Err(DbError::conflict("Order", order_id, expected)),
                None => Err(DbError::not_found("Order", order_id)),
            };
        }

        self.notify();
        self.fetch(order_id).await
    }

    // -------------------------------------------------------------------------
    // Live Feed
    // -------------------------------------------------------------------------

    /// Subscribes to the PENDING order list.
    ///
    /// The first `next()` yields the current list; each following `next()`
    /// waits for an order write and yields a fresh full list.
    pub fn subscribe_pending(&self) -> PendingOrdersSubscription {
        PendingOrdersSubscription {
            repo: self.clone(),
            changes: self.changes.subscribe(),
            primed: false,
        }
    }
}

// =============================================================================
// Pending Orders Subscription
// =============================================================================

/// Live sequence of PENDING-order snapshots. Dropping it detaches.
///
/// ```text
/// next() #1 ──► snapshot now
/// next() #2 ──► (waits for any order write) ──► snapshot
/// ...
/// store closed ──► None
/// ```
#[derive(Debug)]
pub struct PendingOrdersSubscription {
    repo: OrderRepository,
    changes: watch::Receiver<u64>,
    primed: bool,
}

impl PendingOrdersSubscription {
    /// Next full snapshot, or `None` once the store is closed.
    pub async fn next(&mut self) -> Option<DbResult<Vec<Order>>> {
        if self.primed {
            if self.changes.changed().await.is_err() {
                return None;
            }
        } else {
            self.primed = true;
        }
        self.changes.borrow_and_update();

        if self.repo.pool.is_closed() {
            return None;
        }
        Some(self.repo.list_pending().await)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use comanda_core::{OrderDraft, OrderSubmission, PaymentRequest, TenderKind};
    use std::time::Duration;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_order(channel: Channel, price: i64, qty: u32) -> NewOrder {
        let items = vec![LineItem {
            product_id: "roll".to_string(),
            name: "Roll".to_string(),
            unit_price: Money::from_minor(price),
            quantity: qty,
            note: String::new(),
            product_description: None,
        }];
        NewOrder {
            channel,
            table_label: channel.default_table_label().to_string(),
            total: comanda_core::order::compute_running_total(&items),
            line_items: items,
            general_note: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let db = setup().await;
        let repo = db.orders();

        let created = repo.create(&new_order(Channel::Local, 1000, 2), 1).await.unwrap();
        let fetched = repo.fetch(&created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.status, OrderStatus::Pending);
        assert_eq!(fetched.total.minor(), 2000);
        assert_eq!(fetched.table_label, "Local");
        assert_eq!(repo.count_pending().await.unwrap(), 1);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settlement_round_trip_and_conflict() {
        let db = setup().await;
        let repo = db.orders();
        let order = repo.create(&new_order(Channel::Local, 1000, 2), 1).await.unwrap();

        let split = PaymentBreakdown {
            cash: Money::from_minor(1000),
            debit: Money::from_minor(800),
            ..Default::default()
        };
        let charge = order
            .prepare_settlement(&PaymentRequest::mixed(split).with_discount(10))
            .unwrap();
        let settled = repo.save_settlement(&order.id, &charge).await.unwrap();

        assert_eq!(settled.status, OrderStatus::Settled);
        assert!(settled.settled_at.is_some());
        assert_eq!(settled.charge.as_ref(), Some(&charge));
        assert_eq!(settled.payment_breakdown(), Some(&split));
        assert_eq!(repo.count_pending().await.unwrap(), 0);

        // A second till writing the same settlement finds it already settled.
        assert!(matches!(
            repo.save_settlement(&order.id, &charge).await,
            Err(DbError::Conflict { .. })
        ));
        assert!(matches!(repo.save_void(&order.id).await, Err(DbError::Conflict { .. })));
        assert!(matches!(
            repo.save_void("missing").await,
            Err(DbError::NotFound { .. })
        ));

        let amended = repo
            .save_tender(&order.id, &Tender::Single(TenderKind::Transfer))
            .await
            .unwrap();
        assert_eq!(amended.payment_method(), Some(PaymentMethod::Transfer));
        assert!(amended.payment_breakdown().is_none());
        assert_eq!(amended.final_total(), Some(Money::from_minor(1800)));
    }

    #[tokio::test]
    async fn test_settlement_rejects_charge_computed_before_amendment() {
        let db = setup().await;
        let repo = db.orders();
        let order = repo.create(&new_order(Channel::Local, 1000, 1), 1).await.unwrap();
        let stale = order
            .prepare_settlement(&PaymentRequest::single(TenderKind::Cash))
            .unwrap();

        let mut draft = OrderDraft::amend(&order).unwrap();
        draft.line_items[0].quantity = 3;
        let OrderSubmission::Amend(amendment) = draft.prepare_submit(None).unwrap() else {
            panic!("expected an amendment");
        };
        repo.amend(&amendment).await.unwrap();

        assert!(matches!(
            repo.save_settlement(&order.id, &stale).await,
            Err(DbError::Conflict { .. })
        ));
        let stored = repo.fetch(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.charge.is_none());

        let fresh = stored
            .prepare_settlement(&PaymentRequest::single(TenderKind::Cash))
            .unwrap();
        let settled = repo.save_settlement(&order.id, &fresh).await.unwrap();
        assert_eq!(settled.final_total(), Some(Money::from_minor(3000)));
        assert_eq!(settled.running_total().minor(), 3000);
    }

    #[tokio::test]
    async fn test_mixed_without_breakdown_reads_as_unattributed() {
        let db = setup().await;
        let repo = db.orders();
        let before = Utc::now();

        let order = repo.create(&new_order(Channel::Delivery, 2500, 1), 1).await.unwrap();
        let charge = order
            .prepare_settlement(&PaymentRequest::single(TenderKind::Debit))
            .unwrap();
        repo.save_settlement(&order.id, &charge).await.unwrap();
        sqlx::query(
            "UPDATE orders SET payment_method = 'mixed', payment_breakdown = NULL WHERE id = ?1",
        )
        .bind(&order.id)
        .execute(&repo.pool)
        .await
        .unwrap();

        let until = Utc::now() + chrono::Duration::seconds(1);
        let closed = repo.list_closed_between(before, until).await.unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].payment_method(), Some(PaymentMethod::Mixed));
        assert!(closed[0].payment_breakdown().is_none());

        let snapshot = comanda_core::reconciliation::aggregate(&closed);
        assert_eq!(snapshot.total_sales.minor(), 2500);
        assert_eq!(snapshot.total_delivery_sales.minor(), 2500);
        assert_eq!(snapshot.debit.minor(), 0);
        assert_eq!(snapshot.cash.minor(), 0);
    }

    #[tokio::test]
    async fn test_amend_keeps_folio_and_created_at() {
        let db = setup().await;
        let repo = db.orders();
        let order = repo.create(&new_order(Channel::Local, 1000, 1), 7).await.unwrap();

        let mut draft = OrderDraft::amend(&order).unwrap();
        draft.set_channel(Channel::Delivery);
        draft.line_items[0].quantity = 3;
        let OrderSubmission::Amend(amendment) = draft.prepare_submit(None).unwrap() else {
            panic!("expected an amendment");
        };

        let amended = repo.amend(&amendment).await.unwrap();
        assert_eq!(amended.sequence_number, 7);
        assert_eq!(amended.created_at, order.created_at);
        assert_eq!(amended.channel, Channel::Delivery);
        assert_eq!(amended.table_label, "");
        assert_eq!(amended.total.minor(), 3000);
    }

    #[tokio::test]
    async fn test_void_and_closed_window() {
        let db = setup().await;
        let repo = db.orders();
        let before = Utc::now();

        let a = repo.create(&new_order(Channel::Local, 1800, 1), 1).await.unwrap();
        let b = repo.create(&new_order(Channel::Delivery, 3000, 1), 2).await.unwrap();
        let _pending = repo.create(&new_order(Channel::Local, 500, 1), 3).await.unwrap();

        let charge = a
            .prepare_settlement(&PaymentRequest::single(TenderKind::Cash))
            .unwrap();
        repo.save_settlement(&a.id, &charge).await.unwrap();
        let voided = repo.save_void(&b.id).await.unwrap();
        assert_eq!(voided.status, OrderStatus::Voided);
        assert!(voided.voided_at.is_some());
        assert!(voided.charge.is_none());

        let until = Utc::now() + chrono::Duration::seconds(1);
        let closed = repo.list_closed_between(before, until).await.unwrap();
        assert_eq!(closed.len(), 2);
        assert_eq!(closed[0].id, b.id);
        assert_eq!(closed[1].id, a.id);

        let later = repo.list_closed_between(until, until + chrono::Duration::hours(1)).await;
        assert!(later.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_folio_scan_can_hand_out_duplicates() {
        let db = setup().await;
        let repo = db.orders();
        let opened_at = Utc::now();

        let first_scan = repo.sequence_numbers_between(opened_at, None).await.unwrap();
        let second_scan = repo.sequence_numbers_between(opened_at, None).await.unwrap();
        let first = comanda_core::shift::next_sequence_number(first_scan);
        let second = comanda_core::shift::next_sequence_number(second_scan);
        assert_eq!(first, 1);
        assert_eq!(first, second);

        repo.create(&new_order(Channel::Local, 100, 1), first).await.unwrap();
        repo.create(&new_order(Channel::Local, 100, 1), second).await.unwrap();

        let numbers = repo.sequence_numbers_between(opened_at, None).await.unwrap();
        assert_eq!(numbers, vec![1, 1]);
        assert_eq!(comanda_core::shift::next_sequence_number(numbers), 2);
    }

    #[tokio::test]
    async fn test_pending_subscription_emits_on_writes() {
        let db = setup().await;
        let repo = db.orders();
        let mut feed = repo.subscribe_pending();

        let initial = feed.next().await.unwrap().unwrap();
        assert!(initial.is_empty());

        let order = repo.create(&new_order(Channel::Local, 1000, 1), 1).await.unwrap();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), feed.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, order.id);

        repo.save_void(&order.id).await.unwrap();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), feed.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(snapshot.is_empty());

        db.close().await;
        let ended = tokio::time::timeout(Duration::from_secs(5), feed.next())
            .await
            .unwrap();
        assert!(ended.is_none());
    }
}
