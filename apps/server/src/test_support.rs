//! Shared fixtures for handler tests: in-memory database + processor.

use std::sync::Arc;

use bazaar_db::{Database, DbConfig};
use bazaar_settle::{PaymentEventProcessor, PaymentGateway};

use crate::state::AppState;

/// Signing secret used by webhook handler tests.
pub const TEST_SECRET: &str = "whsec_server_test";

/// Fresh state over an isolated in-memory database.
pub async fn test_state() -> AppState {
    test_state_with_secret().await
}

/// Fresh state whose processor verifies against [`TEST_SECRET`].
pub async fn test_state_with_secret() -> AppState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let processor = Arc::new(PaymentEventProcessor::new(
        db.clone(),
        PaymentGateway::new(TEST_SECRET),
    ));
    AppState::new(db, processor)
}
