//! # Payment Event Processor
//!
//! The settlement state machine: one verified gateway event in, at most
//! one order out, originating cart cleared.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Payment Event State Machine                           │
//! │                                                                         │
//! │  Received                                                              │
//! │     │ verify signature                                                  │
//! │     ├── mismatch ─────────────────────────────► Rejected               │
//! │     ▼                                                                   │
//! │  Verified                                                              │
//! │     │ classify type                                                     │
//! │     ├── not charge.succeeded ─────────────────► Ignored                │
//! │     ▼                                                                   │
//! │  Idempotency check (order with source_event_id?)                       │
//! │     ├── found ──► repair cart leftovers ──────► AlreadyProcessed       │
//! │     ▼                                                                   │
//! │  Settling (resolve owner by payer email)                               │
//! │     ├── no such user ─────────────────────────► Unfulfillable          │
//! │     ▼                                                                   │
//! │  Committing  ┄┄┄ per-user critical section ┄┄┄                         │
//! │     │ re-check idempotency, snapshot cart (items + version),           │
//! │     │ persist order+items (UNIQUE source_event_id)                     │
//! │     ├── unique violation (lost the race) ─────► AlreadyProcessed       │
//! │     ▼                                                                   │
//! │  Finalized (clear cart under snapshotted version)                      │
//! │     ├── version conflict ──► targeted repair ─► Finalized              │
//! │     ▼                                                                   │
//! │  Finalized                                                             │
//! │                                                                         │
//! │  Terminal: Rejected, Ignored, AlreadyProcessed, Unfulfillable,         │
//! │  Finalized. Nothing retries automatically except the gateway's own     │
//! │  redelivery, which the idempotency check absorbs.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persist-Then-Clear
//! The order insert commits BEFORE the cart clear runs. If the clear is
//! interrupted, the order is the source of truth: the next delivery of the
//! same event lands in AlreadyProcessed and repairs the cart by removing
//! items added at or before the order's creation time.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use bazaar_core::types::{Order, OrderItem, PaymentEvent, User};
use bazaar_core::validation::validate_payment_event;
use bazaar_db::{Database, DbError};

use crate::error::{SettleError, SettleResult};
use crate::gateway::PaymentGateway;

// =============================================================================
// Outcome
// =============================================================================

/// Terminal state of processing one webhook delivery.
///
/// Every variant except `Rejected` is acknowledged to the gateway as
/// success; duplicates and ignored types are deliberately NOT errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Signature verification failed; nothing was parsed or touched.
    Rejected,

    /// Recognized-but-irrelevant event type; acknowledged, no side effects.
    Ignored {
        /// The event type, for the acknowledgement body and logs.
        kind: String,
    },

    /// An order for this `source_event_id` already exists. Safe to replay
    /// indefinitely.
    AlreadyProcessed {
        /// The existing order's id.
        order_id: String,
    },

    /// No user matches the payer email. Acknowledged (2xx) to stop
    /// redelivery, but surfaced as an operator-visible anomaly.
    Unfulfillable {
        /// The email that failed to resolve.
        payer_email: String,
    },

    /// Order persisted and cart cleared.
    Finalized {
        /// The new order's id.
        order_id: String,
    },
}

impl Outcome {
    /// True if the HTTP layer should acknowledge with a success status.
    pub fn acknowledges_success(&self) -> bool {
        !matches!(self, Outcome::Rejected)
    }
}

// =============================================================================
// Processor
// =============================================================================

/// Consumes verified payment-confirmation events and produces at most one
/// order per event.
pub struct PaymentEventProcessor {
    /// Database access (user, product, order stores).
    db: Database,

    /// Signature verification + event parsing.
    gateway: PaymentGateway,

    /// Per-user critical sections for the snapshot→persist→clear sequence.
    /// Entries are created on first settlement for a user and kept for the
    /// process lifetime (bounded by the active user population).
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PaymentEventProcessor {
    /// Creates a processor.
    pub fn new(db: Database, gateway: PaymentGateway) -> Self {
        PaymentEventProcessor {
            db,
            gateway,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Processes one raw webhook delivery.
    ///
    /// ## Returns
    /// - `Ok(outcome)` for every terminal state of the machine
    /// - `Err(MalformedEvent | Validation)` for boundary rejections after
    ///   a valid signature (mapped to a client error upstream)
    /// - `Err(Persistence)` for store failures mid-settlement (mapped to a
    ///   server error; the gateway's redelivery retries safely)
    pub async fn process(&self, raw: &[u8], signature: &str) -> SettleResult<Outcome> {
        // 1. Received → verify authenticity. A mismatch is terminal with
        //    no side effects and no parsing of untrusted bytes.
        if let Err(e) = self.gateway.verify(raw, signature) {
            warn!(error = %e, "Rejected webhook delivery with bad signature");
            return Ok(Outcome::Rejected);
        }

        // 2. Verified → classify. Only charge.succeeded settles.
        let event = self.gateway.parse(raw)?;

        if !event.kind.is_charge_succeeded() {
            info!(
                external_id = %event.external_id,
                kind = %event.kind,
                "Ignoring non-settlement event"
            );
            return Ok(Outcome::Ignored {
                kind: event.kind.to_string(),
            });
        }

        validate_payment_event(&event)?;

        // 3. Idempotency check, cheap path before any locking.
        if let Some(existing) = self
            .db
            .orders()
            .get_by_source_event(&event.external_id)
            .await?
        {
            return self.already_processed(existing).await;
        }

        // 4. Settling → resolve the owning user.
        let user = match self.db.users().get_by_email(&event.payer_email).await? {
            Some(user) => user,
            None => {
                // Operator-visible anomaly, but acknowledged to the
                // gateway: redelivering cannot make the user exist.
                error!(
                    external_id = %event.external_id,
                    payer_email = %event.payer_email,
                    "Payment event for unknown payer"
                );
                return Ok(Outcome::Unfulfillable {
                    payer_email: event.payer_email,
                });
            }
        };

        // 5-6. Committing → Finalized, serialized per user.
        let lock = self.user_lock(&user.id).await;
        let _guard = lock.lock().await;

        self.settle(&event, &user).await
    }

    /// Steps 5 and 6: snapshot, persist, clear. Runs inside the per-user
    /// critical section.
    async fn settle(&self, event: &PaymentEvent, user: &User) -> SettleResult<Outcome> {
        // Re-check idempotency now that we hold the lock: a concurrent
        // delivery of the same event may have settled while we waited.
        if let Some(existing) = self
            .db
            .orders()
            .get_by_source_event(&event.external_id)
            .await?
        {
            return self.already_processed(existing).await;
        }

        // Snapshot the cart: version first, then items. Both reads sit
        // under the per-user lock; a racing ordinary cart mutation is
        // caught by the version CAS at clear time.
        let snapshot_user = self
            .db
            .users()
            .get_by_id(&user.id)
            .await?
            .ok_or_else(|| SettleError::Persistence(DbError::not_found("User", user.id.clone())))?;

        let cart_items = self.db.users().cart_items(&user.id).await?;

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            owner_id: user.id.clone(),
            // Amount and currency come from the event: they reflect what
            // was actually charged, never recomputed from live prices.
            amount: event.amount,
            currency: event.currency.clone(),
            source_event_id: event.external_id.clone(),
            created_at: now,
        };

        let mut order_items = Vec::with_capacity(cart_items.len());
        for cart_item in &cart_items {
            let product = self
                .db
                .products()
                .get_by_id(&cart_item.product_id)
                .await?
                .ok_or_else(|| {
                    SettleError::Persistence(DbError::not_found(
                        "Product",
                        cart_item.product_id.clone(),
                    ))
                })?;

            order_items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                product_id: product.id.clone(),
                name_snapshot: product.name.clone(),
                price_at_purchase: product.base_price,
                created_at: now,
            });
        }

        // 5. Persist the order. The UNIQUE constraint on source_event_id
        //    is the authoritative duplicate guard.
        match self.db.orders().create(&order, &order_items).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation() => {
                debug!(external_id = %event.external_id, "Lost idempotency race");
                let existing = self
                    .db
                    .orders()
                    .get_by_source_event(&event.external_id)
                    .await?
                    .ok_or(SettleError::Persistence(e))?;
                return self.already_processed(existing).await;
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            order_id = %order.id,
            external_id = %event.external_id,
            amount = order.amount,
            currency = %order.currency,
            items = order_items.len(),
            "Order persisted"
        );

        // 6. Finalized → clear the cart under the snapshotted version.
        //    The order is already durable; from here every failure path
        //    must converge on "cart eventually cleared", never "order lost".
        match self
            .db
            .users()
            .clear_cart(&user.id, snapshot_user.cart_version)
            .await
        {
            Ok(()) => {}
            Err(DbError::VersionConflict { .. }) => {
                // An ordinary cart mutation raced the settlement. Remove
                // only the settled items; whatever was added after the
                // order was created survives.
                warn!(
                    order_id = %order.id,
                    user_id = %user.id,
                    "Cart changed during settlement, applying targeted clear"
                );
                self.db
                    .users()
                    .remove_cart_items_before(&user.id, order.created_at)
                    .await?;
            }
            // Order persisted but clear failed: surface the error. The
            // gateway redelivers, the idempotency check fires, and
            // already_processed() repairs the cart.
            Err(e) => return Err(e.into()),
        }

        info!(order_id = %order.id, user_id = %user.id, "Settlement finalized");

        Ok(Outcome::Finalized { order_id: order.id })
    }

    /// Duplicate-delivery path: acknowledge and repair any cart leftovers
    /// from an interrupted clear.
    async fn already_processed(&self, existing: Order) -> SettleResult<Outcome> {
        let removed = self
            .db
            .users()
            .remove_cart_items_before(&existing.owner_id, existing.created_at)
            .await?;

        if removed > 0 {
            info!(
                order_id = %existing.id,
                removed,
                "Repaired cart leftovers from interrupted settlement"
            );
        }

        debug!(
            order_id = %existing.id,
            external_id = %existing.source_event_id,
            "Duplicate delivery absorbed"
        );

        Ok(Outcome::AlreadyProcessed {
            order_id: existing.id,
        })
    }

    /// Returns the critical-section lock for a user, creating it on first
    /// use.
    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl std::fmt::Debug for PaymentEventProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentEventProcessor").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
