//! # Order Repository
//!
//! Settlement records and their frozen line items.
//!
//! ## Idempotency at the Storage Layer
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │             UNIQUE(orders.source_event_id) is the backstop              │
//! │                                                                         │
//! │  Two deliveries of payment event "evt_1" race into create():           │
//! │                                                                         │
//! │    Delivery A: INSERT ... source_event_id='evt_1'  → ok                │
//! │    Delivery B: INSERT ... source_event_id='evt_1'  → UNIQUE violation  │
//! │                                                                         │
//! │  The settlement engine maps the violation to AlreadyProcessed.         │
//! │  Whatever the in-process locking does, the database guarantees         │
//! │  at most one order per event.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders are immutable after creation: there is deliberately no update
//! method on this repository.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::types::{Order, OrderItem};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists an order with its items in one transaction.
    ///
    /// ## Errors
    /// [`DbError::UniqueViolation`] if an order with the same
    /// `source_event_id` already exists (duplicate payment event). The
    /// caller treats that as success-without-side-effects, not a failure.
    pub async fn create(&self, order: &Order, items: &[OrderItem]) -> DbResult<()> {
        debug!(
            id = %order.id,
            source_event_id = %order.source_event_id,
            items = items.len(),
            "Persisting order"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, owner_id, amount, currency, source_event_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&order.id)
        .bind(&order.owner_id)
        .bind(order.amount)
        .bind(&order.currency)
        .bind(&order.source_event_id)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, name_snapshot,
                    price_at_purchase, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.price_at_purchase)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, owner_id, amount, currency, source_event_id, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Looks up an order by its idempotency key.
    ///
    /// The existence check that absorbs duplicate gateway deliveries.
    pub async fn get_by_source_event(&self, source_event_id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, owner_id, amount, currency, source_event_id, created_at
            FROM orders
            WHERE source_event_id = ?1
            "#,
        )
        .bind(source_event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all items for an order.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, name_snapshot,
                   price_at_purchase, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a user's orders, newest first (order history).
    pub async fn list_by_owner(&self, owner_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, owner_id, amount, currency, source_event_id, created_at
            FROM orders
            WHERE owner_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Counts orders with the given idempotency key (test/diagnostic aid).
    pub async fn count_by_source_event(&self, source_event_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE source_event_id = ?1")
                .bind(source_event_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
