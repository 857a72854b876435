//! # Cart
//!
//! A per-user shopping cart. The database holds one `carts` row per user and
//! one `cart_items` row per product; this type applies the rules before the
//! repository writes the result.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP                              Cart method          Effect           │
//! │  ────                              ───────────          ──────           │
//! │  POST   /api/cart/add          ──► add_item()       ──► push / qty += n  │
//! │  PUT    /api/cart/update       ──► update_quantity()──► qty = n          │
//! │                                                         (n ≤ 0 removes)  │
//! │  DELETE /api/cart/{u}/item/{p} ──► remove_item()    ──► retain           │
//! │  DELETE /api/cart/{u}          ──► clear()          ──► items.clear()    │
//! │  GET    /api/cart/{u}          ──► total()          ──► Σ line totals    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::product::Product;
use crate::validation::{merge_quantities, validate_id, validate_quantity, ValidationResult};
use crate::MAX_CART_ITEMS;

/// A product line in a cart.
///
/// The unit price is captured when the product is first added.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price_cents: product.price_cents,
        }
    }

    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// A user's cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product increases quantity)
/// - Every quantity is ≥ 1
/// - At most [`MAX_CART_ITEMS`] lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Database id (0 until saved).
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty, unsaved cart for `user_id`.
    pub fn new(user_id: i64) -> ValidationResult<Self> {
        validate_id("userId", user_id)?;
        let now = Utc::now();
        Ok(Cart {
            id: 0,
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn item(&self, product_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Adds `quantity` units of `product`, merging with an existing line.
    ///
    /// The resulting line quantity may not exceed the product's stock.
    /// Returns the line as it now stands.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<&CartItem> {
        validate_quantity(quantity)?;

        let idx = match self.items.iter().position(|i| i.product_id == product.id) {
            Some(idx) => {
                let new_qty = merge_quantities(self.items[idx].quantity, quantity)?;
                product.ensure_available(new_qty)?;
                self.items[idx].quantity = new_qty;
                idx
            }
            None => {
                if self.items.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                product.ensure_available(quantity)?;
                self.items.push(CartItem::from_product(product, quantity));
                self.items.len() - 1
            }
        };

        self.touch();
        Ok(&self.items[idx])
    }

    /// Sets a line's quantity. A quantity ≤ 0 removes the line and returns
    /// `None`.
    pub fn update_quantity(
        &mut self,
        product_id: i64,
        quantity: i64,
    ) -> CoreResult<Option<&CartItem>> {
        if quantity <= 0 {
            self.remove_item(product_id)?;
            return Ok(None);
        }
        validate_quantity(quantity)?;

        let idx = self
            .items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or(CoreError::CartItemNotFound(product_id))?;

        self.items[idx].quantity = quantity;
        self.touch();
        Ok(Some(&self.items[idx]))
    }

    pub fn remove_item(&mut self, product_id: i64) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            return Err(CoreError::CartItemNotFound(product_id));
        }
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of the line totals.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
