//! # User Repository
//!
//! Users and their cart line items.
//!
//! ## Optimistic Concurrency on Carts
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 cart_version Compare-And-Swap                           │
//! │                                                                         │
//! │  Every cart mutation (add/remove/clear) increments users.cart_version  │
//! │  in the same transaction as the item change.                           │
//! │                                                                         │
//! │  Checkout snapshots (items, version) together, then clears with        │
//! │  clear_cart(user_id, snapshotted_version):                             │
//! │                                                                         │
//! │    UPDATE users SET cart_version = cart_version + 1                    │
//! │    WHERE id = ? AND cart_version = ?   ← CAS                           │
//! │                                                                         │
//! │  A concurrent add-to-cart bumps the version first, the CAS affects     │
//! │  0 rows, the clear fails with VersionConflict and the racing add       │
//! │  survives instead of silently vanishing.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bazaar_core::types::{CartItem, User};

/// Repository for user and cart database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user.
    pub async fn create(&self, email: &str, name: &str) -> DbResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.to_string(),
            cart_version: 0,
            created_at: Utc::now(),
        };

        debug!(id = %user.id, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, cart_version, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.cart_version)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, cart_version, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by email (payment event payer lookup).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, cart_version, created_at
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user's cart line items, oldest first.
    pub async fn cart_items(&self, user_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, user_id, product_id, added_at
            FROM cart_items
            WHERE user_id = ?1
            ORDER BY added_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Adds a line item to a user's cart.
    ///
    /// Item insert and version bump happen in one transaction so the
    /// version can never lag the cart contents.
    pub async fn add_cart_item(&self, user_id: &str, product_id: &str) -> DbResult<CartItem> {
        let item = CartItem {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            added_at: Utc::now(),
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let bumped = sqlx::query("UPDATE users SET cart_version = cart_version + 1 WHERE id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if bumped.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        sqlx::query(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, added_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&item.id)
        .bind(&item.user_id)
        .bind(&item.product_id)
        .bind(item.added_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(user_id = %user_id, product_id = %product_id, "Added cart item");

        Ok(item)
    }

    /// Removes a single line item from a user's cart.
    pub async fn remove_cart_item(&self, user_id: &str, item_id: &str) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let removed = sqlx::query("DELETE FROM cart_items WHERE id = ?1 AND user_id = ?2")
            .bind(item_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if removed.rows_affected() == 0 {
            return Err(DbError::not_found("CartItem", item_id));
        }

        sqlx::query("UPDATE users SET cart_version = cart_version + 1 WHERE id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Clears a user's cart, conditional on the version observed when the
    /// cart was snapshotted.
    ///
    /// ## Errors
    /// - [`DbError::VersionConflict`] if a concurrent mutation bumped the
    ///   version since the snapshot (the racing mutation survives; the
    ///   caller decides whether to retry or repair)
    /// - [`DbError::NotFound`] if the user does not exist
    pub async fn clear_cart(&self, user_id: &str, expected_version: i64) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let cas = sqlx::query(
            r#"
            UPDATE users SET cart_version = cart_version + 1
            WHERE id = ?1 AND cart_version = ?2
            "#,
        )
        .bind(user_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if cas.rows_affected() == 0 {
            // Distinguish a missing user from a stale version
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?1")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

            return match exists {
                Some(_) => Err(DbError::version_conflict("Cart", user_id, expected_version)),
                None => Err(DbError::not_found("User", user_id)),
            };
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(user_id = %user_id, "Cleared cart");

        Ok(())
    }

    /// Removes cart items added at or before `cutoff`.
    ///
    /// Repair path for a settlement whose order persisted but whose clear
    /// was interrupted: items that were part of the settled snapshot are
    /// removed, items added after settlement survive. Returns the number
    /// of rows removed.
    pub async fn remove_cart_items_before(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> DbResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let removed = sqlx::query("DELETE FROM cart_items WHERE user_id = ?1 AND added_at <= ?2")
            .bind(user_id)
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;

        if removed.rows_affected() > 0 {
            sqlx::query("UPDATE users SET cart_version = cart_version + 1 WHERE id = ?1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(removed.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
