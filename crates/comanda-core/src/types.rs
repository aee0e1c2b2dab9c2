//! # Domain Types
//!
//! Value types shared by orders, payments and shifts.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    MenuItem     │   │    LineItem     │   │    Operator     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  product_id     │   │  user_id        │       │
//! │  │  name           │   │  unit_price     │   │  email          │       │
//! │  │  category       │   │  quantity       │   └─────────────────┘       │
//! │  │  price          │   │  note           │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  TenderKind     │   │ PaymentMethod   │   │     Tender      │       │
//! │  │  Cash           │   │  4 kinds        │   │  Single(kind)   │       │
//! │  │  Debit          │   │  + Mixed        │   │  Mixed(amounts) │       │
//! │  │  Transfer       │   └─────────────────┘   └─────────────────┘       │
//! │  │  Voucher        │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Channel
// =============================================================================

/// Fulfillment path of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    /// Dine-in, served at a table.
    Local,
    /// Sent out for delivery.
    Delivery,
}

impl Default for Channel {
    fn default() -> Self {
        Channel::Local
    }
}

impl Channel {
    /// Table label given to an order when it is placed on this channel.
    pub fn default_table_label(&self) -> &'static str {
        match self {
            Channel::Local => "Local",
            Channel::Delivery => "",
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of an order. `Settled` and `Voided` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Open table or delivery waiting to be paid.
    Pending,
    /// Paid.
    Settled,
    /// Cancelled before payment.
    Voided,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

// =============================================================================
// Tender Kind & Payment Method
// =============================================================================

/// One of the four elemental ways money enters the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderKind {
    Cash,
    Debit,
    Transfer,
    /// Meal voucher card.
    Voucher,
}

impl TenderKind {
    /// All tender kinds in reporting order.
    pub const ALL: [TenderKind; 4] = [
        TenderKind::Cash,
        TenderKind::Debit,
        TenderKind::Transfer,
        TenderKind::Voucher,
    ];
}

/// How an order was paid, as stored on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Debit,
    Transfer,
    Voucher,
    /// Two or more tender kinds summing to the charge.
    Mixed,
}

impl PaymentMethod {
    /// The elemental tender this method maps to, `None` for `Mixed`.
    pub fn tender_kind(&self) -> Option<TenderKind> {
        match self {
            PaymentMethod::Cash => Some(TenderKind::Cash),
            PaymentMethod::Debit => Some(TenderKind::Debit),
            PaymentMethod::Transfer => Some(TenderKind::Transfer),
            PaymentMethod::Voucher => Some(TenderKind::Voucher),
            PaymentMethod::Mixed => None,
        }
    }
}

impl From<TenderKind> for PaymentMethod {
    fn from(kind: TenderKind) -> Self {
        match kind {
            TenderKind::Cash => PaymentMethod::Cash,
            TenderKind::Debit => PaymentMethod::Debit,
            TenderKind::Transfer => PaymentMethod::Transfer,
            TenderKind::Voucher => PaymentMethod::Voucher,
        }
    }
}

/// Case-insensitive parsing (`"cash"`, `"CASH"`, `"Mixed"` ...).
impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "debit" => Ok(PaymentMethod::Debit),
            "transfer" => Ok(PaymentMethod::Transfer),
            "voucher" => Ok(PaymentMethod::Voucher),
            "mixed" => Ok(PaymentMethod::Mixed),
            other => Err(ValidationError::InvalidFormat {
                field: "payment method".to_string(),
                reason: format!("unknown method '{}'", other),
            }),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Debit => "DEBIT",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::Voucher => "VOUCHER",
            PaymentMethod::Mixed => "MIXED",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Payment Breakdown
// =============================================================================

/// Amount per tender kind. Zero means "not used"; zero entries are
/// dropped when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentBreakdown {
    #[serde(default, skip_serializing_if = "Money::is_zero")]
    pub cash: Money,
    #[serde(default, skip_serializing_if = "Money::is_zero")]
    pub debit: Money,
    #[serde(default, skip_serializing_if = "Money::is_zero")]
    pub transfer: Money,
    #[serde(default, skip_serializing_if = "Money::is_zero")]
    pub voucher: Money,
}

impl PaymentBreakdown {
    /// Builds a breakdown from `(kind, amount)` pairs. Later pairs overwrite.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (TenderKind, Money)>) -> Self {
        let mut breakdown = PaymentBreakdown::default();
        for (kind, amount) in pairs {
            breakdown.set(kind, amount);
        }
        breakdown
    }

    pub fn get(&self, kind: TenderKind) -> Money {
        match kind {
            TenderKind::Cash => self.cash,
            TenderKind::Debit => self.debit,
            TenderKind::Transfer => self.transfer,
            TenderKind::Voucher => self.voucher,
        }
    }

    pub fn set(&mut self, kind: TenderKind, amount: Money) {
        match kind {
            TenderKind::Cash => self.cash = amount,
            TenderKind::Debit => self.debit = amount,
            TenderKind::Transfer => self.transfer = amount,
            TenderKind::Voucher => self.voucher = amount,
        }
    }

    /// Sum of all four entries.
    pub fn total(&self) -> Money {
        TenderKind::ALL.iter().map(|k| self.get(*k)).sum()
    }

    /// Tender kinds with a non-zero amount, in reporting order.
    pub fn non_zero_kinds(&self) -> Vec<TenderKind> {
        TenderKind::ALL
            .iter()
            .copied()
            .filter(|k| !self.get(*k).is_zero())
            .collect()
    }
}

// =============================================================================
// Tender
// =============================================================================

/// How a settled order's final total was allocated.
///
/// A closed variant: a `Mixed` tender always holds at least two non-zero
/// entries. A "mixed" payment of one component is stored as `Single`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tender {
    Single(TenderKind),
    Mixed(PaymentBreakdown),
    /// A stored MIXED payment with no breakdown. Settlement never produces
    /// one; it counts toward sales but no tender kind.
    Unattributed,
}

impl Tender {
    /// The stored payment method.
    pub fn method(&self) -> PaymentMethod {
        match self {
            Tender::Single(kind) => PaymentMethod::from(*kind),
            Tender::Mixed(_) | Tender::Unattributed => PaymentMethod::Mixed,
        }
    }

    /// The stored breakdown, only present for `Mixed`.
    pub fn breakdown(&self) -> Option<&PaymentBreakdown> {
        match self {
            Tender::Single(_) | Tender::Unattributed => None,
            Tender::Mixed(breakdown) => Some(breakdown),
        }
    }

    /// Amount contributed to each tender kind for a charge of `amount`.
    pub fn allocate(&self, amount: Money) -> PaymentBreakdown {
        match self {
            Tender::Single(kind) => PaymentBreakdown::from_pairs([(*kind, amount)]),
            Tender::Mixed(breakdown) => *breakdown,
            Tender::Unattributed => PaymentBreakdown::default(),
        }
    }
}

// =============================================================================
// Menu Item
// =============================================================================

/// Read-only catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: Money,
    pub description: Option<String>,
}

// =============================================================================
// Line Item
// =============================================================================

/// One product on an order. Product data is frozen when the item is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    /// Always >= 1 while the item is on the order.
    pub quantity: u32,
    /// Free-text instruction for the kitchen ("no wasabi").
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub product_description: Option<String>,
}

impl LineItem {
    /// A fresh line for `product` with quantity 1 and an empty note.
    pub fn from_menu_item(product: &MenuItem) -> Self {
        LineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            note: String::new(),
            product_description: product.description.clone(),
        }
    }

    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

// =============================================================================
// Operator
// =============================================================================

/// The authenticated person operating the till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Operator {
    pub user_id: String,
    pub email: String,
}

impl Operator {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Operator {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
