//! # Kitchen Tickets
//!
//! The data a ticket printer needs for one order. Layout and printing
//! belong to the renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::order::{compute_running_total, Order, OrderDraft};
use crate::types::{Channel, LineItem};

/// One printed line: `2 x Acevichado Roll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TicketLine {
    pub quantity: u32,
    pub name: String,
    pub product_description: Option<String>,
    pub unit_price: Money,
    pub line_total: Money,
    /// Upper-cased so the kitchen cannot miss it. `None` when blank.
    pub note: Option<String>,
}

impl From<&LineItem> for TicketLine {
    fn from(item: &LineItem) -> Self {
        let note = item.note.trim();
        TicketLine {
            quantity: item.quantity,
            name: item.name.clone(),
            product_description: item
                .product_description
                .as_ref()
                .filter(|d| !d.trim().is_empty())
                .cloned(),
            unit_price: item.unit_price,
            line_total: item.line_total(),
            note: (!note.is_empty()).then(|| note.to_uppercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KitchenTicket {
    pub sequence_number: i64,
    pub channel: Channel,
    pub table_label: String,
    #[ts(as = "String")]
    pub printed_for: DateTime<Utc>,
    pub lines: Vec<TicketLine>,
    pub general_note: Option<String>,
    pub total: Money,
    pub is_delivery: bool,
}

impl KitchenTicket {
    /// Ticket for a persisted order, dated at its creation.
    pub fn for_order(order: &Order) -> Self {
        Self::build(
            order.sequence_number,
            order.channel,
            &order.table_label,
            order.created_at,
            &order.line_items,
            &order.general_note,
        )
    }

    /// Ticket for a draft still on screen, under the folio it will receive.
    pub fn for_draft(draft: &OrderDraft, sequence_number: i64, now: DateTime<Utc>) -> Self {
        Self::build(
            sequence_number,
            draft.channel,
            &draft.table_label,
            now,
            &draft.line_items,
            &draft.general_note,
        )
    }

    fn build(
        sequence_number: i64,
        channel: Channel,
        table_label: &str,
        printed_for: DateTime<Utc>,
        items: &[LineItem],
        general_note: &str,
    ) -> Self {
        let general_note = general_note.trim();
        KitchenTicket {
            sequence_number,
            channel,
            table_label: table_label.to_string(),
            printed_for,
            lines: items.iter().map(TicketLine::from).collect(),
            general_note: (!general_note.is_empty()).then(|| general_note.to_string()),
            total: compute_running_total(items),
            is_delivery: channel == Channel::Delivery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ticket_lines() {
        let mut draft = OrderDraft::new(Channel::Delivery);
        draft.line_items.push(LineItem {
            product_id: "r1".to_string(),
            name: "Acevichado Roll".to_string(),
            unit_price: Money::from_minor(6990),
            quantity: 2,
            note: " sin palta ".to_string(),
            product_description: Some("Salmón, palta".to_string()),
        });
        draft.line_items.push(LineItem {
            product_id: "g1".to_string(),
            name: "Gyozas".to_string(),
            unit_price: Money::from_minor(3500),
            quantity: 1,
            note: String::new(),
            product_description: Some(" ".to_string()),
        });

        let now = Utc.with_ymd_and_hms(2024, 5, 10, 20, 0, 0).unwrap();
        let ticket = KitchenTicket::for_draft(&draft, 12, now);

        assert!(ticket.is_delivery);
        assert_eq!(ticket.sequence_number, 12);
        assert_eq!(ticket.total.minor(), 17480);
        assert_eq!(ticket.lines[0].line_total.minor(), 13980);
        assert_eq!(ticket.lines[0].note.as_deref(), Some("SIN PALTA"));
        assert_eq!(ticket.lines[1].note, None);
        assert_eq!(ticket.lines[1].product_description, None);
        assert_eq!(ticket.general_note, None);
    }
}
