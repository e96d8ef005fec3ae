//! # Settlement Error Types
//!
//! Error taxonomy for rate synchronization and payment settlement.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Settlement Error Categories                         │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   External      │  │     Boundary            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Provider       │  │  Auth (bad signature)   │ │
//! │  │  ConfigLoad/    │  │  Malformed-     │  │  MalformedEvent         │ │
//! │  │  SaveFailed     │  │  Response       │  │  Validation             │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                    │
//! │  │  Persistence    │   NOT errors (modelled as Outcome variants):      │
//! │  │                 │   • duplicate event  → AlreadyProcessed           │
//! │  │  Persistence    │   • ignored type     → Ignored                    │
//! │  │  (from DbError) │   • unknown payer    → Unfulfillable              │
//! │  └─────────────────┘   • missing rate     → unresolved/incomplete sets │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Propagation policy (per component):
//! - Synchronizer: every error is swallowed and logged; rates stay stale
//!   and the schedule continues.
//! - Processor: `Auth`/`MalformedEvent`/`Validation` reject at the
//!   boundary with no side effects; `Persistence`/`Provider` surface so
//!   the gateway's redelivery can retry (safe under idempotency).

use thiserror::Error;

use bazaar_core::error::ValidationError;
use bazaar_db::DbError;

/// Result type alias for settlement operations.
pub type SettleResult<T> = Result<T, SettleError>;

/// Settlement error type covering sync and processing failures.
#[derive(Debug, Error)]
pub enum SettleError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid settlement configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Boundary Errors (webhook)
    // =========================================================================
    /// Webhook signature did not verify against the shared secret.
    #[error("Signature verification failed: {0}")]
    Auth(String),

    /// Event payload could not be parsed.
    #[error("Malformed event payload: {0}")]
    MalformedEvent(String),

    /// Event parsed but failed field validation.
    #[error("Event validation failed: {0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // External Service Errors (rate provider)
    // =========================================================================
    /// Rate provider unreachable, timed out, or returned a failure status.
    #[error("Rate provider error: {0}")]
    Provider(String),

    /// Provider responded but the body violated the expected shape
    /// (missing `rates`, non-finite or negative values, bad codes).
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// Store read/write failure during sync or settlement.
    #[error("Persistence error: {0}")]
    Persistence(#[from] DbError),
}

impl SettleError {
    /// True if the error is a client-side boundary rejection (no retry
    /// will help; the gateway should not redeliver).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SettleError::Auth(_) | SettleError::MalformedEvent(_) | SettleError::Validation(_)
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(SettleError::Auth("bad sig".into()).is_client_error());
        assert!(SettleError::MalformedEvent("not json".into()).is_client_error());
        assert!(!SettleError::Provider("timeout".into()).is_client_error());
        assert!(!SettleError::Persistence(DbError::PoolExhausted).is_client_error());
    }

    #[test]
    fn test_db_error_converts() {
        let err: SettleError = DbError::not_found("User", "u1").into();
        assert!(matches!(err, SettleError::Persistence(_)));
    }
}
