//! # Application State
//!
//! Shared state handed to every axum handler.
//!
//! Cheap to clone: the database wraps a pool and the processor sits
//! behind an `Arc`. Handlers receive exactly what they need via
//! `State<AppState>`; there is no ambient global state anywhere (the rate
//! snapshot in particular is read from the store per request, never from
//! a captured variable).

use std::sync::Arc;

use bazaar_db::Database;
use bazaar_settle::PaymentEventProcessor;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database handle (Rate Store, users/carts, products, orders).
    pub db: Database,

    /// The settlement state machine.
    pub processor: Arc<PaymentEventProcessor>,
}

impl AppState {
    /// Creates application state.
    pub fn new(db: Database, processor: Arc<PaymentEventProcessor>) -> Self {
        AppState { db, processor }
    }
}
