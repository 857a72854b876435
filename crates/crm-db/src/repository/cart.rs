//! # Cart Repository
//!
//! One `carts` row per user, created lazily on the first add. Lines live in
//! `cart_items`, unique per `(cart_id, product_id)`. Product names are read
//! through a join so a renamed product shows its current name.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crm_core::{Cart, CartItem};

#[derive(Debug, sqlx::FromRow)]
struct CartRecord {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads the user's cart with its lines, or `None` if they never had one.
    pub async fn find_by_user(&self, user_id: i64) -> DbResult<Option<Cart>> {
        let record = sqlx::query_as::<_, CartRecord>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(record) => Ok(Some(self.hydrate(record).await?)),
            None => Ok(None),
        }
    }

    /// Returns the user's cart, creating an empty one first if needed.
    pub async fn get_or_create(&self, user_id: i64) -> DbResult<Cart> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO carts (user_id, created_at, updated_at)
            VALUES (?1, ?2, ?2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("Cart", user_id))
    }

    /// Adds `quantity` units to a line in a single statement, creating the line
    /// at the product's current price if the cart does not have it yet.
    ///
    /// The increment happens in SQL, so concurrent adds never overwrite each
    /// other. An existing line keeps its original unit price.
    ///
    /// ## Returns
    /// * `Ok(i64)` - The line's quantity after the add
    /// * `Err(DbError::StockConflict)` - The merged quantity exceeds the
    ///   product's stock or `max_quantity`; nothing was written
    pub async fn add_quantity(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i64,
        max_quantity: i64,
    ) -> DbResult<i64> {
        debug!(cart_id, product_id, quantity, "Adding to cart line");

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let merged: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity, unit_price_cents, added_at)
            SELECT ?1, p.id, ?3, p.price_cents, ?5
            FROM products p
            WHERE p.id = ?2 AND p.stock_quantity >= ?3 AND ?3 <= ?4
            ON CONFLICT (cart_id, product_id) DO UPDATE
            SET quantity = cart_items.quantity + excluded.quantity
            WHERE cart_items.quantity + excluded.quantity <= ?4
              AND cart_items.quantity + excluded.quantity <= (
                  SELECT stock_quantity FROM products WHERE id = excluded.product_id
              )
            RETURNING quantity
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(max_quantity)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(merged) = merged else {
            warn!(cart_id, product_id, quantity, "Cart add exceeds available stock");
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            return Err(DbError::StockConflict { product_id });
        };

        touch(&mut tx, cart_id, now).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(merged)
    }

    /// Writes a line with its absolute quantity, inserting or replacing it.
    pub async fn save_item(&self, cart_id: i64, item: &CartItem) -> DbResult<()> {
        debug!(
            cart_id = cart_id,
            product_id = item.product_id,
            quantity = item.quantity,
            "Saving cart line"
        );

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity, unit_price_cents, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = excluded.quantity
            "#,
        )
        .bind(cart_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        touch(&mut tx, cart_id, now).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Deletes one line. Returns `false` if the cart had no such line.
    pub async fn remove_item(&self, cart_id: i64, product_id: i64) -> DbResult<bool> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1 AND product_id = ?2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            touch(&mut tx, cart_id, now).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(cart_id = cart_id, product_id = product_id, removed, "Removed cart line");
        Ok(removed)
    }

    /// Deletes every line, keeping the cart row. Returns the number removed.
    pub async fn clear(&self, cart_id: i64) -> DbResult<u64> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        touch(&mut tx, cart_id, now).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(cart_id = cart_id, removed = result.rows_affected(), "Cleared cart");
        Ok(result.rows_affected())
    }

    async fn hydrate(&self, record: CartRecord) -> DbResult<Cart> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT ci.product_id, p.name AS product_name, ci.quantity, ci.unit_price_cents
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = ?1
            ORDER BY ci.id
            "#,
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Cart {
            id: record.id,
            user_id: record.user_id,
            items,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

async fn touch(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    cart_id: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
        .bind(cart_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    #[tokio::test]
    async fn test_missing_cart_is_none() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;

        assert!(db.carts().find_by_user(user.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;

        let first = db.carts().get_or_create(user.id()).await.unwrap();
        let second = db.carts().get_or_create(user.id()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_cart_for_unknown_user_fails() {
        let db = test_support::db().await;

        let err = db.carts().get_or_create(999).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_save_item_inserts_then_replaces() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 50).await;

        let mut cart = db.carts().get_or_create(user.id()).await.unwrap();
        let line = cart.add_item(&widget, 2).unwrap().clone();
        db.carts().save_item(cart.id, &line).await.unwrap();

        let line = cart.add_item(&widget, 3).unwrap().clone();
        db.carts().save_item(cart.id, &line).await.unwrap();

        let stored = db.carts().find_by_user(user.id()).await.unwrap().unwrap();
        assert_eq!(stored.item_count(), 1);
        assert_eq!(stored.items[0].quantity, 5);
        assert_eq!(stored.items[0].product_name, "Widget");
        assert_eq!(stored.total().cents(), 5000);
    }

    #[tokio::test]
    async fn test_add_quantity_increments_in_place() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 10).await;
        let cart = db.carts().get_or_create(user.id()).await.unwrap();

        assert_eq!(db.carts().add_quantity(cart.id, widget.id, 2, 100).await.unwrap(), 2);
        assert_eq!(db.carts().add_quantity(cart.id, widget.id, 3, 100).await.unwrap(), 5);

        let stored = db.carts().find_by_user(user.id()).await.unwrap().unwrap();
        assert_eq!(stored.item_count(), 1);
        assert_eq!(stored.items[0].quantity, 5);
        assert_eq!(stored.items[0].unit_price_cents, 1000);
    }

    #[tokio::test]
    async fn test_add_quantity_respects_stock_and_limit() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 10).await;
        let cart = db.carts().get_or_create(user.id()).await.unwrap();

        let err = db.carts().add_quantity(cart.id, widget.id, 11, 100).await.unwrap_err();
        assert!(matches!(err, DbError::StockConflict { .. }));
        assert!(db.carts().find_by_user(user.id()).await.unwrap().unwrap().is_empty());

        db.carts().add_quantity(cart.id, widget.id, 8, 100).await.unwrap();
        let err = db.carts().add_quantity(cart.id, widget.id, 3, 100).await.unwrap_err();
        assert!(matches!(err, DbError::StockConflict { .. }));

        let err = db.carts().add_quantity(cart.id, widget.id, 2, 9).await.unwrap_err();
        assert!(matches!(err, DbError::StockConflict { .. }));

        let stored = db.carts().find_by_user(user.id()).await.unwrap().unwrap();
        assert_eq!(stored.items[0].quantity, 8);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 50).await;
        let gadget = test_support::product(&db, "Gadget", 500, 50).await;

        let mut cart = db.carts().get_or_create(user.id()).await.unwrap();
        for product in [&widget, &gadget] {
            let line = cart.add_item(product, 1).unwrap().clone();
            db.carts().save_item(cart.id, &line).await.unwrap();
        }

        assert!(db.carts().remove_item(cart.id, widget.id).await.unwrap());
        assert!(!db.carts().remove_item(cart.id, widget.id).await.unwrap());

        assert_eq!(db.carts().clear(cart.id).await.unwrap(), 1);

        let stored = db.carts().find_by_user(user.id()).await.unwrap().unwrap();
        assert!(stored.is_empty());
        assert_eq!(stored.id, cart.id);
    }

    #[tokio::test]
    async fn test_deleting_user_removes_cart() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;
        let widget = test_support::product(&db, "Widget", 1000, 50).await;

        let mut cart = db.carts().get_or_create(user.id()).await.unwrap();
        let line = cart.add_item(&widget, 1).unwrap().clone();
        db.carts().save_item(cart.id, &line).await.unwrap();

        db.users().delete(user.id()).await.unwrap();

        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(lines, 0);
        assert!(db.carts().find_by_user(user.id()).await.unwrap().is_none());
    }
}
