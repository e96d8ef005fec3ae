//! # Validation Module
//!
//! Input validation for data crossing the subsystem boundary: webhook
//! event fields and currency codes. Runs before any business logic so
//! malformed input is rejected with a typed error and no side effects.

use crate::error::ValidationError;
use crate::types::PaymentEvent;
use crate::MAX_EVENT_ID_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Currency Code
// =============================================================================

/// Validates a currency code.
///
/// ## Rules
/// - Must not be empty
/// - 3 to 8 characters (ISO codes are 3; room for vendor extensions)
/// - Uppercase ASCII letters only
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::validate_currency_code;
///
/// assert!(validate_currency_code("USD").is_ok());
/// assert!(validate_currency_code("usd").is_err());
/// assert!(validate_currency_code("").is_err());
/// ```
pub fn validate_currency_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "currency".to_string(),
        });
    }

    if code.len() < 3 || code.len() > 8 {
        return Err(ValidationError::OutOfRange {
            field: "currency".to_string(),
            min: 3,
            max: 8,
        });
    }

    if !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be uppercase ASCII letters".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Payment Event
// =============================================================================

/// Validates an email address shape.
///
/// Minimal structural check (non-empty, one `@`, non-empty local and
/// domain parts). Full RFC validation belongs to the auth collaborator;
/// here we only need a usable lookup key.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "payer_email".to_string(),
        });
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidFormat {
            field: "payer_email".to_string(),
            reason: "must look like local@domain".to_string(),
        });
    }

    Ok(())
}

/// Validates a verified payment event before settlement.
///
/// ## Rules
/// - `external_id` present, at most [`MAX_EVENT_ID_LEN`] characters
/// - `amount` strictly positive (a zero/negative charge confirmation is
///   malformed input, not a refund path)
/// - `currency` a well-formed code
/// - `payer_email` a usable lookup key
pub fn validate_payment_event(event: &PaymentEvent) -> ValidationResult<()> {
    let external_id = event.external_id.trim();

    if external_id.is_empty() {
        return Err(ValidationError::Required {
            field: "external_id".to_string(),
        });
    }

    if external_id.len() > MAX_EVENT_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "external_id".to_string(),
            max: MAX_EVENT_ID_LEN,
        });
    }

    if event.amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    validate_currency_code(&event.currency)?;
    validate_email(&event.payer_email)?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
