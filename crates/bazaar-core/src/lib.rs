//! # bazaar-core: Pure Business Logic for the Bazaar Storefront
//!
//! This crate is the **heart** of the pricing-and-settlement subsystem.
//! It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP Handlers (axum)                         │   │
//! │  │    GET /currencies ── GET /products/{id}/prices ── webhook      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   rates   │  │   cart    │  │   │
//! │  │   │ Currency  │  │   Money   │  │ resolve() │  │aggregate()│  │   │
//! │  │   │  Order    │  │ convert   │  │ Snapshot  │  │  totals   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bazaar-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Currency, Product, Order, PaymentEvent, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`rates`] - Price Resolver: base amount × rate snapshot → per-currency prices
//! - [`cart`] - Cart Aggregator: per-item price maps → cart totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in minor units (i64)
//! 4. **Missing data is data**: an unknown exchange rate is reported in an
//!    `unresolved`/`incomplete` set, never raised as an error
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::money::Money;
//! use bazaar_core::rates::{resolve, RateSnapshot};
//!
//! let mut snapshot = RateSnapshot::new();
//! snapshot.set("USD", 100); // identity rate at scale 100
//! snapshot.set("EUR", 92);
//!
//! let resolution = resolve(
//!     Money::from_minor(500),
//!     &["USD".to_string(), "EUR".to_string(), "GBP".to_string()],
//!     &snapshot,
//! );
//!
//! assert_eq!(resolution.prices["USD"], Money::from_minor(500));
//! assert_eq!(resolution.prices["EUR"], Money::from_minor(460));
//! assert!(resolution.unresolved.contains("GBP"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod rates;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bazaar_core::Money` instead of
// `use bazaar_core::money::Money`

pub use cart::{aggregate, CartTotals, PriceMap};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use rates::{resolve, RateSnapshot, Resolution};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Scaling factor applied to stored exchange rates.
///
/// A rate of 100 is the identity: `price × rate / RATE_SCALE` yields the
/// converted amount in the target currency's minor unit. A currency worth
/// half a base unit stores rate 50, one worth double stores 200.
pub const RATE_SCALE: i64 = 100;

/// Maximum items allowed in a single cart.
///
/// Prevents runaway carts and keeps settlement snapshots bounded.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum length of a payment event's external id.
///
/// Gateway ids are short opaque tokens; anything longer is malformed input.
pub const MAX_EVENT_ID_LEN: usize = 128;
