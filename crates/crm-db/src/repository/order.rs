//! # Order Repository
//!
//! Order placement and status changes, each in one SQLite transaction.
//!
//! ## Placement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT INTO orders (...)                      → order id             │
//! │    for each line:                                                       │
//! │      INSERT INTO order_items (...)                                      │
//! │      UPDATE products SET stock_quantity = stock_quantity - qty          │
//! │      WHERE id = ? AND stock_quantity >= qty                             │
//! │        └── 0 rows → ROLLBACK, DbError::StockConflict                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guard catches stock consumed by another request between the handler's
//! availability check and this transaction.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crm_core::{Order, OrderHeader, OrderItem, OrderStatus};

const HEADER_COLUMNS: &str =
    "id, order_guid, customer_id, user_name_order, description, status, order_date";

/// One row of a customer's order history.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderSummary {
    pub order_guid: String,
    pub customer_id: i64,
    pub user_name_order: String,
    pub description: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub order_date: DateTime<Utc>,
    pub item_count: i64,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists a new order and consumes its stock, atomically.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The stored order with database ids assigned
    /// * `Err(DbError::StockConflict)` - A line exceeded current stock; nothing was written
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown customer or product
    pub async fn place(&self, order: &Order) -> DbResult<Order> {
        let header = order.header();
        debug!(order_guid = %header.order_guid, lines = order.item_count(), "Placing order");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                order_guid, customer_id, user_name_order, description,
                status, total_cents, order_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&header.order_guid)
        .bind(header.customer_id)
        .bind(&header.user_name_order)
        .bind(&header.description)
        .bind(header.status)
        .bind(order.total().cents())
        .bind(header.order_date)
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_rowid();
        let now = Utc::now();

        for item in order.items() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, product_id, product_name, quantity,
                    unit_price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.line_total().cents())
            .execute(&mut *tx)
            .await?;

            let updated = sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity - ?2,
                    updated_at = ?3
                WHERE id = ?1 AND stock_quantity >= ?2
                "#,
            )
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                warn!(
                    order_guid = %header.order_guid,
                    product_id = item.product_id,
                    "Stock guard failed, rolling back order"
                );
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                return Err(DbError::StockConflict {
                    product_id: item.product_id,
                });
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_guid = %header.order_guid,
            order_id = order_id,
            total_cents = order.total().cents(),
            "Order placed"
        );

        let mut stored = order.clone();
        stored.assign_id(order_id);
        Ok(stored)
    }

    /// Loads an order and its lines by external GUID.
    pub async fn get_by_guid(&self, guid: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {HEADER_COLUMNS} FROM orders WHERE order_guid = ?1");
        let header = sqlx::query_as::<_, OrderHeader>(&sql)
            .bind(guid)
            .fetch_optional(&self.pool)
            .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(header.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Order::restore(header, items)))
    }

    /// Lists a customer's orders, newest first.
    pub async fn list_for_customer(&self, customer_id: i64) -> DbResult<Vec<OrderSummary>> {
        let summaries = sqlx::query_as::<_, OrderSummary>(
            r#"
            SELECT o.order_guid, o.customer_id, o.user_name_order, o.description,
                   o.status, o.total_cents, o.order_date,
                   COUNT(oi.id) AS item_count
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.customer_id = ?1
            GROUP BY o.id
            ORDER BY o.order_date DESC, o.id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(customer_id = customer_id, count = summaries.len(), "Listed orders");
        Ok(summaries)
    }

    /// Persists `order.status()`, provided the stored status is still
    /// `previous`. Moving to Cancelled returns every line's quantity to stock
    /// in the same transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::ConcurrentUpdate)` - Status changed since the order was read
    pub async fn save_status(&self, order: &Order, previous: OrderStatus) -> DbResult<()> {
        let next = order.status();
        debug!(order_guid = %order.guid(), from = %previous, to = %next, "Saving order status");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query("UPDATE orders SET status = ?3 WHERE id = ?1 AND status = ?2")
            .bind(order.id())
            .bind(previous)
            .bind(next)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            return Err(DbError::ConcurrentUpdate {
                entity: "Order".to_string(),
                id: order.guid().to_string(),
            });
        }

        if next == OrderStatus::Cancelled {
            restock(&mut tx, order.items()).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_guid = %order.guid(), status = %next, "Order status changed");
        Ok(())
    }
}

async fn restock(tx: &mut Transaction<'_, Sqlite>, items: &[OrderItem]) -> DbResult<()> {
    let now = Utc::now();
    for item in items {
        sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use crm_core::{Product, User};

    async fn stock(db: &crate::Database, product: &Product) -> i64 {
        db.products()
            .get_by_id(product.id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    async fn count(db: &crate::Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    fn new_order(user: &User, lines: &[(&Product, i64)]) -> Order {
        let mut order = Order::new(user.email(), user.id(), Some("Test order")).unwrap();
        for (product, qty) in lines {
            order
                .add_item(product.id, &product.name, *qty, product.price_cents)
                .unwrap();
        }
        order
    }

    #[tokio::test]
    async fn test_place_order_decrements_stock() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 10).await;
        let gadget = test_support::product(&db, "Gadget", 1550, 5).await;

        let order = new_order(&user, &[(&widget, 2), (&gadget, 1)]);
        let placed = db.orders().place(&order).await.unwrap();
        assert!(placed.id() > 0);

        assert_eq!(stock(&db, &widget).await, 8);
        assert_eq!(stock(&db, &gadget).await, 4);

        let stored = db.orders().get_by_guid(order.guid()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Pending);
        assert_eq!(stored.item_count(), 2);
        assert_eq!(stored.total().cents(), 3550);
        assert_eq!(stored.items()[0].product_name, "Widget");
    }

    #[tokio::test]
    async fn test_stock_conflict_rolls_back_everything() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 10).await;
        let gadget = test_support::product(&db, "Gadget", 1550, 1).await;

        // Second line exceeds stock; the first line's decrement must not survive.
        let order = new_order(&user, &[(&widget, 2), (&gadget, 3)]);
        let err = db.orders().place(&order).await.unwrap_err();

        assert!(matches!(err, DbError::StockConflict { product_id } if product_id == gadget.id));
        assert_eq!(stock(&db, &widget).await, 10);
        assert_eq!(stock(&db, &gadget).await, 1);
        assert_eq!(count(&db, "orders").await, 0);
        assert_eq!(count(&db, "order_items").await, 0);
        assert!(db.orders().get_by_guid(order.guid()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_customer_is_foreign_key_violation() {
        let db = test_support::db().await;
        let widget = test_support::product(&db, "Widget", 1000, 10).await;

        let mut order = Order::new("ghost@example.com", 999, None).unwrap();
        order.add_item(widget.id, "Widget", 1, 1000).unwrap();

        let err = db.orders().place(&order).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(stock(&db, &widget).await, 10);
    }

    #[tokio::test]
    async fn test_list_for_customer() {
        let db = test_support::db().await;
        let jane = test_support::user(&db, "jane@example.com").await;
        let john = test_support::user(&db, "john@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 10).await;
        let gadget = test_support::product(&db, "Gadget", 500, 10).await;

        db.orders()
            .place(&new_order(&jane, &[(&widget, 1), (&gadget, 2)]))
            .await
            .unwrap();
        db.orders()
            .place(&new_order(&jane, &[(&widget, 1)]))
            .await
            .unwrap();
        db.orders()
            .place(&new_order(&john, &[(&gadget, 1)]))
            .await
            .unwrap();

        let orders = db.orders().list_for_customer(jane.id()).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.customer_id == jane.id()));

        let mut counts: Vec<i64> = orders.iter().map(|o| o.item_count).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2]);

        let totals: i64 = orders.iter().map(|o| o.total_cents).sum();
        assert_eq!(totals, 3000);

        assert!(db.orders().list_for_customer(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_restocks() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 10).await;

        let mut order = db
            .orders()
            .place(&new_order(&user, &[(&widget, 4)]))
            .await
            .unwrap();
        assert_eq!(stock(&db, &widget).await, 6);

        order.update_status(OrderStatus::Cancelled).unwrap();
        db.orders()
            .save_status(&order, OrderStatus::Pending)
            .await
            .unwrap();

        assert_eq!(stock(&db, &widget).await, 10);
        let stored = db.orders().get_by_guid(order.guid()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_stale_status_is_rejected() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 10).await;

        let mut order = db
            .orders()
            .place(&new_order(&user, &[(&widget, 1)]))
            .await
            .unwrap();

        order.update_status(OrderStatus::Processed).unwrap();
        db.orders()
            .save_status(&order, OrderStatus::Pending)
            .await
            .unwrap();

        order.update_status(OrderStatus::Cancelled).unwrap();
        let err = db
            .orders()
            .save_status(&order, OrderStatus::Pending)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ConcurrentUpdate { .. }));
        assert_eq!(stock(&db, &widget).await, 9);
    }

    #[tokio::test]
    async fn test_deleting_user_removes_orders() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 10).await;

        db.orders()
            .place(&new_order(&user, &[(&widget, 1)]))
            .await
            .unwrap();

        db.users().delete(user.id()).await.unwrap();

        assert_eq!(count(&db, "orders").await, 0);
        assert_eq!(count(&db, "order_items").await, 0);
        assert_eq!(count(&db, "products").await, 1);
    }
}
