//! # comanda-core: Pure Business Logic for the Comanda register
//!
//! Everything that decides what is true about money and shift state lives
//! here, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 register (commands + CLI)                       │   │
//! │  │   submit_order, settle_order, open_shift, close_shift, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ comanda-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌────────────┐  ┌──────────┐  ┌──────────────┐ │   │
//! │  │   │  order   │  │ settlement │  │  shift   │  │reconciliation│ │   │
//! │  │   │  Order   │  │  discount  │  │  open    │  │  aggregate   │ │   │
//! │  │   │  Draft   │  │  tenders   │  │  close   │  │  reports     │ │   │
//! │  │   └──────────┘  └────────────┘  └──────────┘  └──────────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  comanda-db (Storage Layer)                     │   │
//! │  │       orders / shifts / menu_items, server-side timestamps      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Channel, status, tender kinds, line items, menu items
//! - [`money`] - Money type with integer arithmetic
//! - [`order`] - Order aggregate and the local order draft
//! - [`settlement`] - Discounts, tender resolution, mixed-payment entry
//! - [`shift`] - Shift state machine, folio numbers, calendar days
//! - [`reconciliation`] - Closing totals, close confirmation, reports
//! - [`ticket`] - Kitchen ticket data
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use comanda_core::settlement::compute_discounted_total;
//! use comanda_core::Money;
//!
//! // 10% off 2000, rounded half-up
//! let total = compute_discounted_total(Money::from_minor(2000), 10);
//! assert_eq!(total.minor(), 1800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod reconciliation;
pub mod settlement;
pub mod shift;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{Order, OrderDraft, OrderSubmission, SettledCharge};
pub use reconciliation::{CloseConfirmation, ReconciliationSnapshot, ShiftReport};
pub use settlement::{MixedEntry, PaymentRequest};
pub use shift::{ReportScope, Shift, ShiftOpening, ShiftState};
pub use ticket::KitchenTicket;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Upper bound of a discount percentage.
pub const MAX_DISCOUNT_PERCENT: u8 = 100;

/// Longest note accepted on a line item or an order.
///
/// ## Business Reason
/// Notes are printed on an 80mm kitchen ticket.
pub const MAX_NOTE_LENGTH: usize = 200;

/// Opening float suggested when none is configured, in minor units.
pub const DEFAULT_OPENING_FLOAT: i64 = 20_000;
