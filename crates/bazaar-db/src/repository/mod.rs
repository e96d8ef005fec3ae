//! # Repository Module
//!
//! Database repository implementations for Bazaar.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Handler / settlement engine                                           │
//! │       │                                                                 │
//! │       │  db.currencies().snapshot()                                     │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  CurrencyRepository                                                    │
//! │  ├── list_all(&self)                                                   │
//! │  ├── snapshot(&self)                                                   │
//! │  └── apply_rates(&self, table)                                         │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`currency::CurrencyRepository`] - The Rate Store: tracked currencies and rates
//! - [`product::ProductRepository`] - Product price reads
//! - [`user::UserRepository`] - Users and cart line items (versioned mutations)
//! - [`order::OrderRepository`] - Settlement records (unique idempotency key)

pub mod currency;
pub mod order;
pub mod product;
pub mod user;
