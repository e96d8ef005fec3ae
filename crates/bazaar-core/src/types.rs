//! # Domain Types
//!
//! Core domain types for the pricing-and-settlement subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Currency     │   │     Product     │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code (PK)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  symbol         │   │  base_price     │   │  email (unique) │       │
//! │  │  rate (scaled)  │   │  base_full_price│   │  cart_version   │       │
//! │  │  updated_at     │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartItem     │   │      Order      │   │  PaymentEvent   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  user_id (FK)   │   │  source_event_id│   │  external_id    │       │
//! │  │  product_id     │   │  (UNIQUE - the  │   │  (idempotency   │       │
//! │  │  added_at       │   │  idempotency    │   │   key)          │       │
//! │  └─────────────────┘   │  key)           │   │  not persisted  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are raw `i64` minor units on row-shaped structs (so the
//! database layer can derive `FromRow`), with [`Money`] accessor methods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Currency
// =============================================================================

/// A tracked currency and its latest known exchange rate.
///
/// One row per code. Mutated only by the Rate Synchronizer; never deleted
/// during normal operation. `rate` is scaled by [`crate::RATE_SCALE`] and
/// is `None` until the first successful sync initializes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Currency {
    /// ISO-style currency code ("USD", "EUR"). Primary key.
    pub code: String,

    /// Display symbol ("$", "€").
    pub symbol: String,

    /// Units of this currency per base unit, scaled by 100.
    /// `None` means tracked-but-uninitialized (no sync has supplied it yet).
    pub rate: Option<i64>,

    /// When the rate was last overwritten by a sync run.
    pub updated_at: Option<DateTime<Utc>>,

    /// When this currency was first tracked.
    pub created_at: DateTime<Utc>,
}

impl Currency {
    /// True once a sync has initialized the rate.
    #[inline]
    pub fn has_rate(&self) -> bool {
        self.rate.is_some()
    }
}

// =============================================================================
// Product (price-relevant fields)
// =============================================================================

/// A catalog product, reduced to the fields the core consumes.
///
/// The catalog collaborator owns the full schema; this subsystem reads the
/// two price fields (base currency minor units) and the name for order
/// snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, frozen onto order items at settlement.
    pub name: String,

    /// Selling price in base-currency minor units.
    pub base_price: i64,

    /// Undiscounted price in base-currency minor units.
    pub base_full_price: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.base_price)
    }

    /// Returns the undiscounted price as Money.
    #[inline]
    pub fn full_price(&self) -> Money {
        Money::from_minor(self.base_full_price)
    }
}

// =============================================================================
// User
// =============================================================================

/// A storefront user, reduced to what settlement needs.
///
/// `cart_version` is the optimistic-concurrency token: every cart mutation
/// increments it, and checkout-time cart clearing is conditional on the
/// version observed when the cart was snapshotted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,

    /// Lookup key for payment events (payer email). Unique.
    pub email: String,

    pub name: String,

    /// Incremented on every cart mutation.
    pub cart_version: i64,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart
// =============================================================================

/// A line item in a user's cart.
///
/// A cart is the ordered sequence of a user's line items (by `added_at`).
/// Two units of the same product are two line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// A settlement record: created exactly once per payment event, immutable
/// after creation.
///
/// `amount` and `currency` are copied from the payment event (what was
/// actually charged), never recomputed from live prices. The UNIQUE
/// constraint on `source_event_id` is what makes duplicate gateway
/// deliveries safe to replay indefinitely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub owner_id: String,

    /// Charged amount in `currency` minor units, taken from the event.
    pub amount: i64,

    /// Currency code the charge was made in.
    pub currency: String,

    /// Idempotency key: the gateway event's external id.
    pub source_event_id: String,

    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the charged amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount)
    }
}

/// A line item frozen onto an order at settlement time.
///
/// Snapshot pattern: `price_at_purchase` and `name_snapshot` preserve the
/// sale history even if the product changes later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,

    /// Product name at time of settlement (frozen).
    pub name_snapshot: String,

    /// Base-currency price at time of settlement (frozen).
    pub price_at_purchase: i64,

    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the frozen purchase price as Money.
    #[inline]
    pub fn price_at_purchase(&self) -> Money {
        Money::from_minor(self.price_at_purchase)
    }
}

// =============================================================================
// Payment Events
// =============================================================================

/// Classification of an incoming gateway event.
///
/// Only `ChargeSucceeded` drives settlement; every other kind is
/// acknowledged and ignored (that is not an error).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventKind {
    /// A charge completed successfully; triggers settlement.
    ChargeSucceeded,

    /// Any other gateway event type, carried verbatim for logging.
    Other(String),
}

impl PaymentEventKind {
    /// Wire name of the charge-succeeded event type.
    pub const CHARGE_SUCCEEDED: &'static str = "charge.succeeded";

    /// Classifies a gateway `type` string.
    pub fn parse(raw: &str) -> Self {
        if raw == Self::CHARGE_SUCCEEDED {
            PaymentEventKind::ChargeSucceeded
        } else {
            PaymentEventKind::Other(raw.to_string())
        }
    }

    /// True if this kind triggers settlement.
    #[inline]
    pub fn is_charge_succeeded(&self) -> bool {
        matches!(self, PaymentEventKind::ChargeSucceeded)
    }
}

impl std::fmt::Display for PaymentEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentEventKind::ChargeSucceeded => write!(f, "{}", Self::CHARGE_SUCCEEDED),
            PaymentEventKind::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// A verified payment-confirmation event from the external gateway.
///
/// Not persisted: duplicate detection relies on the existence of an
/// [`Order`] with a matching `source_event_id`, so nothing beyond that is
/// stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// The gateway's event id; the idempotency key.
    pub external_id: String,

    /// Classified event type.
    pub kind: PaymentEventKind,

    /// Charged amount in `currency` minor units.
    pub amount: i64,

    /// Currency code the charge was made in.
    pub currency: String,

    /// Email of the paying customer; resolves the owning user.
    pub payer_email: String,
}

impl PaymentEvent {
    /// Returns the charged amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parse() {
        assert_eq!(
            PaymentEventKind::parse("charge.succeeded"),
            PaymentEventKind::ChargeSucceeded
        );
        assert_eq!(
            PaymentEventKind::parse("charge.refunded"),
            PaymentEventKind::Other("charge.refunded".to_string())
        );
    }

    #[test]
    fn test_event_kind_display_round_trips() {
        let kind = PaymentEventKind::parse("invoice.paid");
        assert_eq!(kind.to_string(), "invoice.paid");
        assert!(!kind.is_charge_succeeded());
    }

    #[test]
    fn test_currency_has_rate() {
        let currency = Currency {
            code: "USD".to_string(),
            symbol: "$".to_string(),
            rate: None,
            updated_at: None,
            created_at: Utc::now(),
        };
        assert!(!currency.has_rate());
    }
}
