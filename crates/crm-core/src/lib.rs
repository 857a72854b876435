//! # crm-core: Domain Models for the CRM Back Office
//!
//! Pure domain logic with zero I/O dependencies: the entities the back office
//! manages and the rules they must always satisfy.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CRM Back Office Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    crm-api (axum)                               │   │
//! │  │    /api/auth ── /api/users ── /api/products ── /api/orders     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ crm-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────┐ ┌──────────┐  │   │
//! │  │   │  user   │ │ product │ │  order  │ │  cart  │ │validation│  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └────────┘ └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    crm-db (Database Layer)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Shared enums (`UserRole`, `OrderStatus`)
//! - [`user`] - `User` with validated name/email/password hash
//! - [`product`] - Catalog `Product`
//! - [`order`] - `Order` aggregate and `OrderItem`
//! - [`cart`] - Per-user `Cart` and `CartItem`
//! - [`money`] - Integer-cent `Money`
//! - [`validation`] - Field validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use crm_core::{Money, Order};
//!
//! let mut order = Order::new("jane@example.com", 7, None).unwrap();
//! order.add_item(1, "Keyboard", 2, 4_999).unwrap();
//! order.add_item(2, "Mouse", 1, 1_999).unwrap();
//!
//! assert_eq!(order.total(), Money::from_cents(11_997));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod product;
pub mod types;
pub mod user;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{Order, OrderHeader, OrderItem, DEFAULT_ORDER_DESCRIPTION};
pub use product::{Product, ProductDraft};
pub use types::{OrderStatus, UserRole};
pub use user::User;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct product lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;
