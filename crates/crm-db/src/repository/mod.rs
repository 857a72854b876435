//! # Repository Module
//!
//! Table-specific database operations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                           │
//! │       │                                                                 │
//! │       │  state.db().orders().place(&order)                              │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── place(&self, order)          (transaction)                        │
//! │  ├── get_by_guid(&self, guid)                                          │
//! │  ├── list_for_customer(&self, id)                                      │
//! │  └── save_status(&self, order, previous)                               │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, sqlx::query_as)                          │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Accounts, lookup by email, cascading delete
//! - [`ProductRepository`] - Catalog CRUD
//! - [`CartRepository`] - Per-user cart and its lines
//! - [`OrderRepository`] - Transactional placement and status changes

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::CartRepository;
pub use order::{OrderRepository, OrderSummary};
pub use product::ProductRepository;
pub use user::UserRepository;
