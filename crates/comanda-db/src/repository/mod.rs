//! # Repository Module
//!
//! One repository per collection.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  register command                                                       │
//! │       │                                                                 │
//! │       │  db.orders().save_settlement(&id, &charge)                      │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── create / amend / save_settlement / save_tender / save_void         │
//! │  ├── get_by_id / list_pending / count_pending                           │
//! │  ├── sequence_numbers_between / list_closed_between                     │
//! │  └── subscribe_pending                                                  │
//! │       │                                                                 │
//! │       │  SQL, one document per statement                                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OrderRepository`](order::OrderRepository) - Orders and the pending feed
//! - [`ShiftRepository`](shift::ShiftRepository) - Shift open/close
//! - [`MenuRepository`](menu::MenuRepository) - Read-only catalog

pub mod menu;
pub mod order;
pub mod shift;
