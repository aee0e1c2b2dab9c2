//! # Order Aggregate
//!
//! One customer order (table or delivery) and the local draft it is built
//! from.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   OrderDraft (local, unsent)                                            │
//! │   add_item / adjust_quantity / set_item_note / set_channel              │
//! │        │                                                                │
//! │        │ prepare_submit(active shift)                                   │
//! │        ▼                                                                │
//! │   ┌─────────┐   settle (settlement.rs)   ┌─────────┐                    │
//! │   │ PENDING │ ─────────────────────────► │ SETTLED │  terminal          │
//! │   └─────────┘                            └─────────┘                    │
//! │        │                                                                │
//! │        │ void                            ┌─────────┐                    │
//! │        └───────────────────────────────► │ VOIDED  │  terminal          │
//! │                                          └─────────┘                    │
//! │                                                                         │
//! │   A PENDING order can be pulled back into an amending draft, edited    │
//! │   and resubmitted. Folio number and created_at never change.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::shift::Shift;
use crate::types::{
    Channel, LineItem, MenuItem, OrderStatus, PaymentBreakdown, PaymentMethod, Tender,
};
use crate::validation::{validate_note, ValidationResult};

// =============================================================================
// Running Total
// =============================================================================

/// Sum of `unit_price × quantity` over the line items. Pure.
pub fn compute_running_total(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::line_total).sum()
}

// =============================================================================
// Settled Charge
// =============================================================================

/// What was charged and how it was tendered. Written once, at settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettledCharge {
    /// Running total at settlement, before discount.
    pub original_total: Money,
    pub discount_percent: u8,
    pub final_total: Money,
    pub tender: Tender,
}

// =============================================================================
// Order
// =============================================================================

/// A persisted order.
///
/// ## Invariants
/// - `Settled` ⇔ `charge` is `Some`, and the charge's tender accounts for
///   exactly `final_total`
/// - `Voided` never carries a charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Folio number, unique by convention within a shift.
    pub sequence_number: i64,
    pub channel: Channel,
    pub table_label: String,
    pub line_items: Vec<LineItem>,
    pub general_note: String,
    pub status: OrderStatus,
    /// Running total as last submitted.
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub settled_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
    pub charge: Option<SettledCharge>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Sum of the current line items.
    pub fn running_total(&self) -> Money {
        compute_running_total(&self.line_items)
    }

    pub fn final_total(&self) -> Option<Money> {
        self.charge.as_ref().map(|c| c.final_total)
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.charge.as_ref().map(|c| c.tender.method())
    }

    pub fn payment_breakdown(&self) -> Option<&PaymentBreakdown> {
        self.charge.as_ref().and_then(|c| c.tender.breakdown())
    }

    /// `settled_at`, else `voided_at`, else `created_at`.
    ///
    /// Decides which shift an order reconciles into and the display order.
    pub fn closing_timestamp(&self) -> DateTime<Utc> {
        self.settled_at.or(self.voided_at).unwrap_or(self.created_at)
    }

    /// Amount shown for the order: the final total once settled, otherwise
    /// the stored running total.
    pub fn reported_total(&self) -> Money {
        self.final_total().unwrap_or(self.total)
    }

    /// Fails with `InvalidState` unless the order is still PENDING.
    pub fn ensure_pending(&self) -> CoreResult<()> {
        if !self.is_pending() {
            return Err(CoreError::invalid_state("Order", &self.id, self.status));
        }
        Ok(())
    }

    /// PENDING → VOIDED, stamping `voided_at`.
    pub fn void(&mut self, at: DateTime<Utc>) -> CoreResult<()> {
        self.ensure_pending()?;
        self.status = OrderStatus::Voided;
        self.voided_at = Some(at);
        Ok(())
    }
}

// =============================================================================
// Order Draft
// =============================================================================

/// Whether a draft creates a new order or edits a PENDING one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DraftMode {
    New,
    Amend { order_id: String },
}

/// The order under construction at the till. Nothing here is persisted
/// until it is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    pub mode: DraftMode,
    pub channel: Channel,
    pub table_label: String,
    pub line_items: Vec<LineItem>,
    pub general_note: String,
}

impl Default for OrderDraft {
    fn default() -> Self {
        OrderDraft::new(Channel::Local)
    }
}

impl OrderDraft {
    /// An empty new-order draft.
    pub fn new(channel: Channel) -> Self {
        OrderDraft {
            mode: DraftMode::New,
            channel,
            table_label: channel.default_table_label().to_string(),
            line_items: Vec::new(),
            general_note: String::new(),
        }
    }

    /// Loads a PENDING order for editing.
    pub fn amend(order: &Order) -> CoreResult<Self> {
        order.ensure_pending()?;
        Ok(OrderDraft {
            mode: DraftMode::Amend {
                order_id: order.id.clone(),
            },
            channel: order.channel,
            table_label: order.table_label.clone(),
            line_items: order.line_items.clone(),
            general_note: order.general_note.clone(),
        })
    }

    pub fn is_amendment(&self) -> bool {
        matches!(self.mode, DraftMode::Amend { .. })
    }

    /// Items may change while a shift is open, or at any time when editing
    /// an order that already exists.
    pub fn is_editable(&self, active_shift: Option<&Shift>) -> bool {
        self.is_amendment() || active_shift.map_or(false, Shift::is_open)
    }

    /// Adds one unit of `product`.
    ///
    /// An existing line for the same product gets `quantity + 1`. Otherwise a
    /// new line is appended with quantity 1 and an empty note.
    ///
    /// Returns `false` (and changes nothing) when the draft is not editable.
    pub fn add_item(&mut self, product: &MenuItem, active_shift: Option<&Shift>) -> bool {
        if !self.is_editable(active_shift) {
            return false;
        }

        match self
            .line_items
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.line_items.push(LineItem::from_menu_item(product)),
        }
        true
    }

    /// Sets the quantity to `max(0, current + delta)`; a line reaching zero
    /// is removed.
    ///
    /// Returns `false` when the draft is not editable or has no such line.
    pub fn adjust_quantity(
        &mut self,
        product_id: &str,
        delta: i64,
        active_shift: Option<&Shift>,
    ) -> bool {
        if !self.is_editable(active_shift) {
            return false;
        }

        let Some(index) = self
            .line_items
            .iter()
            .position(|line| line.product_id == product_id)
        else {
            return false;
        };

        let quantity = (self.line_items[index].quantity as i64)
            .saturating_add(delta)
            .max(0);
        if quantity == 0 {
            self.line_items.remove(index);
        } else {
            self.line_items[index].quantity = quantity.min(u32::MAX as i64) as u32;
        }
        true
    }

    /// Replaces the note on a line. Returns whether the line was found.
    pub fn set_item_note(&mut self, product_id: &str, note: &str) -> ValidationResult<bool> {
        let note = validate_note("note", note)?;
        match self
            .line_items
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => {
                line.note = note;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_general_note(&mut self, note: &str) -> ValidationResult<()> {
        self.general_note = validate_note("general note", note)?;
        Ok(())
    }

    pub fn set_table_label(&mut self, label: impl Into<String>) {
        self.table_label = label.into();
    }

    /// Switches channel. The table label resets only on an actual change.
    pub fn set_channel(&mut self, channel: Channel) {
        if self.channel != channel {
            self.channel = channel;
            self.table_label = channel.default_table_label().to_string();
        }
    }

    pub fn running_total(&self) -> Money {
        compute_running_total(&self.line_items)
    }

    /// Validates the draft for sending to the store.
    ///
    /// ## Errors
    /// - `Validation(EmptyOrder)` when there are no line items
    /// - `ShiftClosed` for a new order with no OPEN shift
    pub fn prepare_submit(&self, active_shift: Option<&Shift>) -> CoreResult<OrderSubmission> {
        if self.line_items.is_empty() {
            return Err(ValidationError::EmptyOrder.into());
        }

        match &self.mode {
            DraftMode::New => {
                if !active_shift.map_or(false, Shift::is_open) {
                    return Err(CoreError::ShiftClosed);
                }
                Ok(OrderSubmission::Create(NewOrder {
                    channel: self.channel,
                    table_label: self.table_label.clone(),
                    line_items: self.line_items.clone(),
                    general_note: self.general_note.clone(),
                    total: self.running_total(),
                }))
            }
            DraftMode::Amend { order_id } => Ok(OrderSubmission::Amend(OrderAmendment {
                order_id: order_id.clone(),
                channel: self.channel,
                table_label: self.table_label.clone(),
                line_items: self.line_items.clone(),
                general_note: self.general_note.clone(),
                total: self.running_total(),
            })),
        }
    }
}

// =============================================================================
// Submission
// =============================================================================

/// What a validated draft turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSubmission {
    Create(NewOrder),
    Amend(OrderAmendment),
}

/// A new PENDING order. The store assigns id, folio and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub channel: Channel,
    pub table_label: String,
    pub line_items: Vec<LineItem>,
    pub general_note: String,
    pub total: Money,
}

/// Replacement content for a still-PENDING order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAmendment {
    pub order_id: String,
    pub channel: Channel,
    pub table_label: String,
    pub line_items: Vec<LineItem>,
    pub general_note: String,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::ShiftOpening;
    use crate::types::Operator;
    use chrono::TimeZone;

    fn product(id: &str, price: i64) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: format!("Producto {}", id),
            category: "Rolls".to_string(),
            price: Money::from_minor(price),
            description: Some("10 piezas".to_string()),
        }
    }

    fn open_shift() -> Shift {
        ShiftOpening::new(Money::zero(), Some(Operator::new("uid", "a@b.cl")))
            .unwrap()
            .into_shift("s1".to_string(), Utc.with_ymd_and_hms(2024, 5, 10, 15, 0, 0).unwrap())
    }

    fn pending_order(items: Vec<LineItem>) -> Order {
        let total = compute_running_total(&items);
        Order {
            id: "o1".to_string(),
            sequence_number: 1,
            channel: Channel::Local,
            table_label: "Mesa 4".to_string(),
            line_items: items,
            general_note: String::new(),
            status: OrderStatus::Pending,
            total,
            created_at: Utc.with_ymd_and_hms(2024, 5, 10, 16, 0, 0).unwrap(),
            settled_at: None,
            voided_at: None,
            charge: None,
        }
    }

    #[test]
    fn test_add_item_merges_same_product() {
        let shift = open_shift();
        let mut draft = OrderDraft::default();
        let roll = product("roll", 1000);

        assert!(draft.add_item(&roll, Some(&shift)));
        assert!(draft.add_item(&roll, Some(&shift)));
        assert!(draft.add_item(&product("gyoza", 3500), Some(&shift)));

        assert_eq!(draft.line_items.len(), 2);
        assert_eq!(draft.line_items[0].quantity, 2);
        assert_eq!(draft.line_items[1].note, "");
        assert_eq!(draft.line_items[1].product_description.as_deref(), Some("10 piezas"));
        assert_eq!(draft.running_total().minor(), 5500);
    }

    #[test]
    fn test_add_item_is_silent_no_op_without_open_shift() {
        let mut draft = OrderDraft::default();
        assert!(!draft.add_item(&product("roll", 1000), None));
        assert!(draft.line_items.is_empty());

        let mut closed = open_shift();
        closed.state = crate::shift::ShiftState::Closed;
        assert!(!draft.add_item(&product("roll", 1000), Some(&closed)));
        assert!(draft.line_items.is_empty());
    }

    #[test]
    fn test_amending_draft_edits_without_open_shift() {
        let order = pending_order(vec![LineItem::from_menu_item(&product("roll", 1000))]);
        let mut draft = OrderDraft::amend(&order).unwrap();
        assert!(draft.add_item(&product("roll", 1000), None));
        assert!(draft.adjust_quantity("roll", -1, None));
        assert_eq!(draft.line_items[0].quantity, 1);
    }

    #[test]
    fn test_adjust_quantity_removes_at_zero_and_never_goes_negative() {
        let shift = open_shift();
        let mut draft = OrderDraft::default();
        draft.add_item(&product("roll", 1000), Some(&shift));

        assert!(draft.adjust_quantity("roll", 3, Some(&shift)));
        assert_eq!(draft.line_items[0].quantity, 4);

        assert!(draft.adjust_quantity("roll", -10, Some(&shift)));
        assert!(draft.line_items.is_empty());

        assert!(!draft.adjust_quantity("missing", 1, Some(&shift)));
    }

    #[test]
    fn test_adjust_quantity_saturates_on_extreme_deltas() {
        let shift = open_shift();
        let mut draft = OrderDraft::default();
        let roll = product("roll", 1000);
        draft.add_item(&roll, Some(&shift));

        assert!(draft.adjust_quantity("roll", i64::MAX, Some(&shift)));
        assert_eq!(draft.line_items[0].quantity, u32::MAX);

        assert!(draft.add_item(&roll, Some(&shift)));
        assert_eq!(draft.line_items[0].quantity, u32::MAX);

        assert!(draft.adjust_quantity("roll", i64::MIN, Some(&shift)));
        assert!(draft.line_items.is_empty());
    }

    #[test]
    fn test_general_note_is_trimmed_and_bounded() {
        let mut draft = OrderDraft::default();
        draft.set_general_note("  sin wasabi ").unwrap();
        assert_eq!(draft.general_note, "sin wasabi");

        let long = "x".repeat(crate::MAX_NOTE_LENGTH + 1);
        assert!(draft.set_general_note(&long).is_err());
        assert_eq!(draft.general_note, "sin wasabi");
    }

    #[test]
    fn test_set_item_note_and_channel() {
        let shift = open_shift();
        let mut draft = OrderDraft::default();
        draft.add_item(&product("roll", 1000), Some(&shift));

        assert_eq!(draft.set_item_note("roll", "sin palta"), Ok(true));
        assert_eq!(draft.line_items[0].note, "sin palta");
        assert_eq!(draft.set_item_note("ghost", "x"), Ok(false));

        assert_eq!(draft.table_label, "Local");
        draft.set_table_label("Mesa 7");
        draft.set_channel(Channel::Local);
        assert_eq!(draft.table_label, "Mesa 7");
        draft.set_channel(Channel::Delivery);
        assert_eq!(draft.table_label, "");
        draft.set_channel(Channel::Local);
        assert_eq!(draft.table_label, "Local");
    }

    #[test]
    fn test_prepare_submit_rules() {
        let shift = open_shift();
        let mut draft = OrderDraft::default();
        assert_eq!(
            draft.prepare_submit(Some(&shift)),
            Err(CoreError::Validation(ValidationError::EmptyOrder))
        );

        draft.add_item(&product("roll", 1000), Some(&shift));
        assert!(matches!(
            draft.prepare_submit(Some(&shift)),
            Ok(OrderSubmission::Create(NewOrder { total, .. })) if total.minor() == 1000
        ));
        assert_eq!(draft.prepare_submit(None), Err(CoreError::ShiftClosed));

        let order = pending_order(vec![LineItem::from_menu_item(&product("roll", 1000))]);
        let amend = OrderDraft::amend(&order).unwrap();
        assert!(matches!(
            amend.prepare_submit(None),
            Ok(OrderSubmission::Amend(OrderAmendment { order_id, .. })) if order_id == "o1"
        ));
    }

    #[test]
    fn test_void_only_from_pending() {
        let mut order = pending_order(vec![LineItem::from_menu_item(&product("roll", 1000))]);
        let at = Utc.with_ymd_and_hms(2024, 5, 10, 17, 0, 0).unwrap();
        order.void(at).unwrap();
        assert_eq!(order.status, OrderStatus::Voided);
        assert_eq!(order.voided_at, Some(at));
        assert!(order.charge.is_none());
        assert_eq!(order.closing_timestamp(), at);
        assert_eq!(order.reported_total().minor(), 1000);

        assert!(matches!(order.void(at), Err(CoreError::InvalidState { .. })));
        assert!(matches!(OrderDraft::amend(&order), Err(CoreError::InvalidState { .. })));
    }
}
