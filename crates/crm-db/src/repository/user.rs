//! # User Repository
//!
//! Accounts. Emails are stored lowercased and the column is
//! `UNIQUE COLLATE NOCASE`, so lookups are case-insensitive.
//!
//! Deleting a user relies on `ON DELETE CASCADE` to remove the cart, cart
//! items, orders and order items in the same statement.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crm_core::user::normalize_email;
use crm_core::{User, UserRole};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Raw `users` row.
#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: UserRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    fn into_user(self) -> DbResult<User> {
        User::restore(
            self.id,
            &self.name,
            &self.email,
            &self.password_hash,
            self.role,
            self.created_at,
            self.updated_at,
        )
        .map_err(|e| DbError::invalid_record("users", e))
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user and returns it with its assigned id.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn insert(&self, user: &User) -> DbResult<User> {
        debug!(email = %user.email(), "Inserting user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(user.name())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.role())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", user.email()),
            other => other,
        })?;

        let id = result.last_insert_rowid();
        info!(user_id = id, "User created");
        Ok(user.clone().with_id(id))
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        record.map(UserRecord::into_user).transpose()
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        record.map(UserRecord::into_user).transpose()
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    pub async fn email_exists(&self, email: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE email = ?1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Writes every mutable column of `user`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No user with that id
    pub async fn update(&self, user: &User) -> DbResult<()> {
        debug!(user_id = user.id(), "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = ?2,
                email = ?3,
                password_hash = ?4,
                role = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(user.id())
        .bind(user.name())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.role())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user.id()));
        }

        Ok(())
    }

    /// Deletes a user together with their cart and orders.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(user_id = id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
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

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = test_support::db().await;
        let user = User::new("Jane Doe", "Jane@Example.com", "hash", UserRole::Regular).unwrap();

        let saved = db.users().insert(&user).await.unwrap();
        assert!(saved.id() > 0);

        let by_id = db.users().get_by_id(saved.id()).await.unwrap().unwrap();
        assert_eq!(by_id.email(), "jane@example.com");
        assert_eq!(by_id.role(), UserRole::Regular);

        let by_email = db.users().get_by_email("JANE@example.COM").await.unwrap();
        assert_eq!(by_email.map(|u| u.id()), Some(saved.id()));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_support::db().await;
        test_support::user(&db, "jane@example.com").await;

        let again = User::new("Other Jane", "JANE@example.com", "hash", UserRole::Regular).unwrap();
        let err = db.users().insert(&again).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_missing_user() {
        let db = test_support::db().await;

        assert!(db.users().get_by_id(999).await.unwrap().is_none());
        assert!(!db.users().exists(999).await.unwrap());
        assert!(!db.users().email_exists("nobody@example.com").await.unwrap());
        assert!(db.users().delete(999).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_role_persists() {
        let db = test_support::db().await;
        let mut user = test_support::user(&db, "jane@example.com").await;

        assert!(user.update_role(UserRole::Admin));
        db.users().update(&user).await.unwrap();

        let reloaded = db.users().get_by_id(user.id()).await.unwrap().unwrap();
        assert!(reloaded.is_admin());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_support::db().await;
        let user = test_support::user(&db, "jane@example.com").await;

        db.users().delete(user.id()).await.unwrap();

        assert!(!db.users().exists(user.id()).await.unwrap());
        assert_eq!(db.users().count().await.unwrap(), 0);
    }
}
