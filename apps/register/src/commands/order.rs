//! # Order Commands

use tracing::{debug, info};

use comanda_core::{CoreError, KitchenTicket, Order, OrderDraft, OrderSubmission, Shift};
use comanda_db::{Database, PendingOrdersSubscription};

use crate::commands::shift::next_sequence_number;
use crate::error::{ApiError, ApiResult};

/// Sends a draft to the store.
///
/// A new draft becomes a PENDING order numbered by scanning the shift's
/// orders; an amending draft replaces the content of its PENDING order.
pub async fn submit_order(
    db: &Database,
    draft: &OrderDraft,
    active_shift: Option<&Shift>,
) -> ApiResult<Order> {
    debug!(items = draft.line_items.len(), amendment = draft.is_amendment(), "submit_order command");

    match draft.prepare_submit(active_shift)? {
        OrderSubmission::Create(new_order) => {
            let shift = active_shift.ok_or(CoreError::ShiftClosed)?;
            let sequence_number = next_sequence_number(db, shift).await?;
            let order = db.orders().create(&new_order, sequence_number).await?;

            info!(
                order_id = %order.id,
                sequence_number,
                channel = ?order.channel,
                total = %order.total,
                "Order created"
            );
            Ok(order)
        }
        OrderSubmission::Amend(amendment) => {
            let order = db.orders().amend(&amendment).await?;
            info!(order_id = %order.id, total = %order.total, "Order amended");
            Ok(order)
        }
    }
}

/// Loads a PENDING order into a draft for editing.
pub async fn edit_order(db: &Database, order_id: &str) -> ApiResult<OrderDraft> {
    let order = get_order(db, order_id).await?;
    Ok(OrderDraft::amend(&order)?)
}

/// PENDING → VOIDED.
pub async fn void_order(db: &Database, order_id: &str) -> ApiResult<Order> {
    debug!(order_id = %order_id, "void_order command");

    let order = get_order(db, order_id).await?;
    order.ensure_pending()?;

    let voided = db.orders().save_void(order_id).await?;
    info!(order_id = %voided.id, total = %voided.total, "Order voided");
    Ok(voided)
}

pub async fn get_order(db: &Database, order_id: &str) -> ApiResult<Order> {
    db.orders()
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", order_id))
}

/// PENDING orders, oldest first.
pub async fn pending_orders(db: &Database) -> ApiResult<Vec<Order>> {
    Ok(db.orders().list_pending().await?)
}

/// Live feed of the PENDING list for the floor view.
pub fn watch_pending(db: &Database) -> PendingOrdersSubscription {
    db.orders().subscribe_pending()
}

/// Kitchen ticket for a stored order.
pub async fn kitchen_ticket(db: &Database, order_id: &str) -> ApiResult<KitchenTicket> {
    let order = get_order(db, order_id).await?;
    Ok(KitchenTicket::for_order(&order))
}
