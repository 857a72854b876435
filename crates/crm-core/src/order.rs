//! # Order Aggregate
//!
//! An order is a header plus its line items. The total is always derived from
//! the lines, never stored independently on the aggregate.
//!
//! ## Placement Flow
//! ```text
//! POST /api/orders
//!      │
//!      ▼
//! Order::new(username, customer_id, description)
//!      │
//!      ▼
//! for each requested line:
//!     product.ensure_available(qty)      (crm-core::Product)
//!     order.add_item(id, name, qty, price)
//!      │
//!      ▼
//! order.ensure_has_items()
//!      │
//!      ▼
//! OrderRepository::place(&order)         (one SQLite transaction)
//!     INSERT orders → INSERT order_items → UPDATE products SET stock - qty
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::OrderStatus;
use crate::validation::{
    merge_quantities, validate_id, validate_order_description, validate_order_username,
    validate_quantity, validate_unit_price_cents, ValidationResult,
};

/// Stored when a client omits the description.
pub const DEFAULT_ORDER_DESCRIPTION: &str = "There was no description provided";

// =============================================================================
// Order Item
// =============================================================================

/// One product line of an order.
///
/// `product_name` and `unit_price_cents` are snapshots taken at placement, so
/// later catalog edits don't rewrite order history.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Database id (0 until saved).
    pub id: i64,
    /// Owning order's database id (0 until saved).
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl OrderItem {
    pub fn new(
        product_id: i64,
        product_name: &str,
        quantity: i64,
        unit_price_cents: i64,
    ) -> ValidationResult<Self> {
        validate_id("productId", product_id)?;
        validate_quantity(quantity)?;
        validate_unit_price_cents(unit_price_cents)?;

        Ok(OrderItem {
            id: 0,
            order_id: 0,
            product_id,
            product_name: product_name.to_string(),
            quantity,
            unit_price_cents,
        })
    }

    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// quantity × unit price
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order Header
// =============================================================================

/// The scalar columns of an order.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHeader {
    pub id: i64,
    pub order_guid: String,
    pub customer_id: i64,
    /// Username snapshot (who placed the order).
    pub user_name_order: String,
    pub description: String,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// An order and its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    header: OrderHeader,
    items: Vec<OrderItem>,
}

impl Order {
    /// Starts a new Pending order with a fresh GUID and no items.
    pub fn new(
        user_name_order: &str,
        customer_id: i64,
        description: Option<&str>,
    ) -> ValidationResult<Self> {
        validate_order_username(user_name_order)?;
        validate_id("customerId", customer_id)?;

        let description = match description.map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => DEFAULT_ORDER_DESCRIPTION.to_string(),
        };
        validate_order_description(&description)?;

        Ok(Order {
            header: OrderHeader {
                id: 0,
                order_guid: Uuid::new_v4().to_string(),
                customer_id,
                user_name_order: user_name_order.trim().to_string(),
                description,
                status: OrderStatus::Pending,
                order_date: Utc::now(),
            },
            items: Vec::new(),
        })
    }

    /// Rebuilds a persisted order.
    pub fn restore(header: OrderHeader, items: Vec<OrderItem>) -> Self {
        Order { header, items }
    }

    pub fn header(&self) -> &OrderHeader {
        &self.header
    }

    pub fn id(&self) -> i64 {
        self.header.id
    }

    pub fn guid(&self) -> &str {
        &self.header.order_guid
    }

    pub fn customer_id(&self) -> i64 {
        self.header.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.header.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all line totals.
    pub fn total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Units of `product_id` across the order.
    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .sum()
    }

    /// Assigns database ids after the header row is inserted.
    pub fn assign_id(&mut self, id: i64) {
        self.header.id = id;
        for item in &mut self.items {
            item.order_id = id;
        }
    }

    /// Adds a line. A product already on the order has its quantity increased
    /// and keeps its original unit price.
    ///
    /// Rejects a merged quantity above
    /// [`MAX_LINE_QUANTITY`](crate::validation::MAX_LINE_QUANTITY) and a total that
    /// would not fit in an `i64` of cents.
    pub fn add_item(
        &mut self,
        product_id: i64,
        product_name: &str,
        quantity: i64,
        unit_price_cents: i64,
    ) -> ValidationResult<()> {
        let item = OrderItem::new(product_id, product_name, quantity, unit_price_cents)?;
        let position = self
            .items
            .iter()
            .position(|existing| existing.product_id == product_id);

        let unit_price = match position {
            Some(idx) => self.items[idx].unit_price(),
            None => item.unit_price(),
        };
        unit_price
            .checked_multiply_quantity(item.quantity)
            .and_then(|added| self.total().checked_add(added))
            .ok_or_else(|| ValidationError::TooLarge {
                field: "total".to_string(),
                max: i64::MAX,
            })?;

        match position {
            Some(idx) => {
                let existing = &mut self.items[idx];
                existing.quantity = merge_quantities(existing.quantity, item.quantity)?;
            }
            None => self.items.push(item),
        }
        Ok(())
    }

    /// An order must have at least one line before it is placed.
    pub fn ensure_has_items(&self) -> ValidationResult<()> {
        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }
        Ok(())
    }

    /// Moves the order to `next` if the transition is allowed.
    pub fn update_status(&mut self, next: OrderStatus) -> CoreResult<()> {
        let current = self.header.status;
        if !current.can_transition_to(next) {
            return Err(CoreError::InvalidStatusTransition {
                from: current,
                to: next,
            });
        }
        self.header.status = next;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new("jane@example.com", 7, Some("Birthday gifts")).unwrap()
    }

    #[test]
    fn test_new_order_defaults() {
        let order = order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.customer_id(), 7);
        assert!(uuid::Uuid::parse_str(order.guid()).is_ok());
        assert_eq!(order.total(), Money::zero());
        assert!(order.ensure_has_items().is_err());
    }

    #[test]
    fn test_missing_description_uses_default() {
        let order = Order::new("jane@example.com", 7, None).unwrap();
        assert_eq!(order.header().description, DEFAULT_ORDER_DESCRIPTION);

        let order = Order::new("jane@example.com", 7, Some("   ")).unwrap();
        assert_eq!(order.header().description, DEFAULT_ORDER_DESCRIPTION);
    }

    #[test]
    fn test_new_order_rejects_bad_header() {
        assert!(Order::new("ab", 7, None).is_err());
        assert!(Order::new("jane@example.com", 0, None).is_err());
        assert!(Order::new("jane@example.com", 7, Some(&"x".repeat(501))).is_err());
    }

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let mut order = order();
        order.add_item(1, "Widget", 2, 1000).unwrap();
        order.add_item(2, "Gadget", 1, 1550).unwrap();
        order.add_item(3, "Gizmo", 4, 525).unwrap();

        let expected: Money = order.items().iter().map(OrderItem::line_total).sum();
        assert_eq!(order.total(), expected);
        assert_eq!(order.total().cents(), 5650);
        assert_eq!(order.item_count(), 3);
    }

    #[test]
    fn test_same_product_merges_lines() {
        let mut order = order();
        order.add_item(1, "Widget", 2, 1000).unwrap();
        order.add_item(1, "Widget", 3, 1000).unwrap();

        assert_eq!(order.item_count(), 1);
        assert_eq!(order.quantity_of(1), 5);
        assert_eq!(order.total().cents(), 5000);
    }

    #[test]
    fn test_merged_quantity_cannot_overflow() {
        let mut order = order();
        order.add_item(1, "Widget", 1, 1000).unwrap();

        assert!(order.add_item(1, "Widget", i64::MAX, 1000).is_err());
        assert!(order
            .add_item(1, "Widget", crate::validation::MAX_LINE_QUANTITY, 1000)
            .is_err());

        assert_eq!(order.quantity_of(1), 1);
        assert_eq!(order.total().cents(), 1000);
    }

    #[test]
    fn test_item_invariants() {
        let mut order = order();
        assert!(order.add_item(1, "Widget", 0, 1000).is_err());
        assert!(order.add_item(1, "Widget", 1, 0).is_err());
        assert!(order.add_item(0, "Widget", 1, 100).is_err());
        assert_eq!(order.item_count(), 0);
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem::new(1, "Widget", 3, 299).unwrap();
        assert_eq!(item.line_total().cents(), 897);
    }

    #[test]
    fn test_assign_id_propagates_to_items() {
        let mut order = order();
        order.add_item(1, "Widget", 1, 100).unwrap();
        order.assign_id(55);

        assert_eq!(order.id(), 55);
        assert!(order.items().iter().all(|item| item.order_id == 55));
    }

    #[test]
    fn test_status_updates() {
        let mut order = order();
        order.update_status(OrderStatus::Processed).unwrap();
        order.update_status(OrderStatus::Shipped).unwrap();

        let err = order.update_status(OrderStatus::Cancelled).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatusTransition { .. }));
        assert_eq!(order.status(), OrderStatus::Shipped);

        order.update_status(OrderStatus::Delivered).unwrap();
        assert!(order.status().is_terminal());
    }
}
