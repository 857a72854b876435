//! # Product Repository
//!
//! Catalog CRUD. Stock moves for orders happen inside
//! [`OrderRepository`](super::OrderRepository) transactions.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crm_core::Product;

pub(crate) const PRODUCT_COLUMNS: &str = "id, product_guid, name, description, price_cents, \
     stock_quantity, category, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists the whole catalog in insertion order.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product and returns it with its assigned id.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(guid = %product.product_guid, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                product_guid, name, description, price_cents,
                stock_quantity, category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.product_guid)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(&product.category)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(product_id = id, name = %product.name, "Product created");

        Ok(Product {
            id,
            ..product.clone()
        })
    }

    /// Writes the editable columns of `product`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(product_id = product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                stock_quantity = ?5,
                category = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(&product.category)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use crm_core::ProductDraft;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_support::db().await;
        let saved = test_support::product(&db, "Widget", 1099, 5).await;
        assert!(saved.id > 0);

        let by_id = db.products().get_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(by_id, saved);

        assert!(db.products().get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_in_insertion_order() {
        let db = test_support::db().await;
        test_support::product(&db, "Widget", 100, 1).await;
        test_support::product(&db, "Gadget", 200, 2).await;

        let names: Vec<String> = db
            .products()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Widget", "Gadget"]);
        assert_eq!(db.products().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_support::db().await;
        let mut product = test_support::product(&db, "Widget", 100, 1).await;

        product
            .apply(ProductDraft {
                name: "Widget Pro".to_string(),
                description: "Now with more widget".to_string(),
                price_cents: 250,
                stock_quantity: 40,
                category: "Tools".to_string(),
            })
            .unwrap();
        db.products().update(&product).await.unwrap();

        let reloaded = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(reloaded.name, "Widget Pro");
        assert_eq!(reloaded.price_cents, 250);
        assert_eq!(reloaded.stock_quantity, 40);
        assert_eq!(reloaded.product_guid, product.product_guid);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = test_support::db().await;
        let mut product = test_support::product(&db, "Widget", 100, 1).await;
        product.id = 999;

        assert!(db.products().update(&product).await.unwrap_err().is_not_found());
    }
}
