//! # Register Commands
//!
//! Every workflow step the register exposes.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── shift.rs    ◄─── Open, folio numbers, two-step close
//! ├── order.rs    ◄─── Submit drafts, void, pending feed, tickets
//! ├── payment.rs  ◄─── Settle, amend tender
//! ├── report.rs   ◄─── Shift report by date
//! └── menu.rs     ◄─── Catalog lookups, adding items to a draft
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  caller (CLI, UI)                                                       │
//! │       │   settle_order(&db, &order_id, &request)                        │
//! │       ▼                                                                 │
//! │  1. read the document(s) from comanda-db                                │
//! │  2. decide with comanda-core (pure, may fail)                           │
//! │  3. write ONE document back with a conditional update                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Result<T, ApiError>                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Active Shift
//! There is no ambient "current shift". Commands that depend on it take an
//! `Option<&Shift>` the caller looked up with
//! [`shift::current_shift`].

pub mod menu;
pub mod order;
pub mod payment;
pub mod report;
pub mod shift;
