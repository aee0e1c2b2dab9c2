//! # Payment Commands
//!
//! Settlement and tender amendment. The amount math lives in
//! `comanda_core::settlement`; these commands only read, decide, write.

use tracing::{debug, info};

use comanda_core::settlement::compute_discounted_total;
use comanda_core::{Money, Order, PaymentBreakdown, PaymentMethod, PaymentRequest, Shift};
use comanda_db::Database;
use serde::Serialize;

use crate::commands::order::get_order;
use crate::error::ApiResult;

/// Totals shown while the operator picks a discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargePreview {
    pub original_total: Money,
    pub discount_percent: i64,
    pub final_total: Money,
}

/// Previews the charge for a discount, with the same rounding settlement
/// uses.
pub async fn preview_charge(
    db: &Database,
    order_id: &str,
    discount_percent: i64,
) -> ApiResult<ChargePreview> {
    let order = get_order(db, order_id).await?;
    let original_total = order.running_total();

    Ok(ChargePreview {
        original_total,
        discount_percent,
        final_total: compute_discounted_total(original_total, discount_percent),
    })
}

/// PENDING → SETTLED.
pub async fn settle_order(
    db: &Database,
    order_id: &str,
    request: &PaymentRequest,
) -> ApiResult<Order> {
    debug!(
        order_id = %order_id,
        method = %request.method,
        discount = request.discount_percent,
        "settle_order command"
    );

    let order = get_order(db, order_id).await?;
    let charge = order.prepare_settlement(request)?;
    let settled = db.orders().save_settlement(order_id, &charge).await?;

    info!(
        order_id = %settled.id,
        sequence_number = settled.sequence_number,
        final_total = %charge.final_total,
        method = %charge.tender.method(),
        "Order settled"
    );
    Ok(settled)
}

/// Changes how a settled order was paid. The amount owed stays the same.
pub async fn amend_payment(
    db: &Database,
    order_id: &str,
    method: PaymentMethod,
    breakdown: Option<&PaymentBreakdown>,
    active_shift: Option<&Shift>,
) -> ApiResult<Order> {
    debug!(order_id = %order_id, method = %method, "amend_payment command");

    let order = get_order(db, order_id).await?;
    let tender = order.prepare_payment_amendment(method, breakdown, active_shift)?;
    let amended = db.orders().save_tender(order_id, &tender).await?;

    info!(
        order_id = %amended.id,
        method = %tender.method(),
        "Payment amended"
    );
    Ok(amended)
}
