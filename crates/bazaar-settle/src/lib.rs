//! # bazaar-settle: Settlement Engine for Bazaar
//!
//! Owns the two event-driven halves of the pricing-and-settlement
//! subsystem:
//!
//! - the **Rate Synchronizer**, a recurring background task refreshing the
//!   Rate Store from an external provider, and
//! - the **Payment Event Processor**, which turns verified gateway events
//!   into at-most-one order each and clears the originating cart.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Payment Event Lifecycle                             │
//! │                                                                         │
//! │  raw payload + signature header                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentGateway::verify ── mismatch ──► Rejected                       │
//! │       │ ok                                                              │
//! │       ▼                                                                 │
//! │  classify type ── not charge.succeeded ──► Ignored                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  order exists for external_id? ── yes ──► AlreadyProcessed (+ repair)  │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  user by payer email ── none ──► Unfulfillable                         │
//! │       │                                                                 │
//! │       ▼  (per-user critical section)                                    │
//! │  snapshot cart ─► persist order (UNIQUE source_event_id) ─► clear cart │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Finalized                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - TOML configuration (provider, gateway, server, database)
//! - [`error`] - Settlement error taxonomy
//! - [`provider`] - External exchange-rate provider client
//! - [`synchronizer`] - Recurring rate refresh background task
//! - [`gateway`] - Payment gateway signature verification + event parsing
//! - [`processor`] - The settlement state machine

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod gateway;
pub mod processor;
pub mod provider;
pub mod synchronizer;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::SettleConfig;
pub use error::{SettleError, SettleResult};
pub use gateway::{PaymentGateway, SIGNATURE_HEADER};
pub use processor::{Outcome, PaymentEventProcessor};
pub use provider::{HttpRateProvider, RateProvider};
pub use synchronizer::{RateSynchronizer, RateSynchronizerHandle};
