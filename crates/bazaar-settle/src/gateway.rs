//! # Payment Gateway Verification
//!
//! Signature verification and event parsing for the inbound webhook.
//!
//! ## Signature Scheme
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Webhook Signature Verification                        │
//! │                                                                         │
//! │  Gateway side:                                                         │
//! │    signature = hex( HMAC-SHA256( signing_secret, raw_body ) )          │
//! │    POST /webhooks/payment                                              │
//! │      X-Gateway-Signature: <signature>                                  │
//! │      <raw_body>                                                         │
//! │                                                                         │
//! │  Our side:                                                             │
//! │    verify() recomputes the MAC over the UNPARSED body and compares     │
//! │    in constant time (Mac::verify_slice). Only a verified payload is    │
//! │    ever parsed; a mismatch produces Rejected with no side effects.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{SettleError, SettleResult};
use bazaar_core::types::{PaymentEvent, PaymentEventKind};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC signature.
pub const SIGNATURE_HEADER: &str = "X-Gateway-Signature";

// =============================================================================
// Wire Types
// =============================================================================

/// Raw gateway event payload, as delivered.
#[derive(Debug, Deserialize)]
struct WireEvent {
    /// The gateway's event id (idempotency key).
    id: String,

    /// Event type string, e.g. "charge.succeeded".
    #[serde(rename = "type")]
    kind: String,

    /// Charged amount in minor units of `currency`.
    amount: i64,

    /// Currency code the charge was made in.
    currency: String,

    /// Paying customer's email.
    payer_email: String,
}

// =============================================================================
// Payment Gateway
// =============================================================================

/// The external payment gateway abstraction: verifies webhook signatures
/// against the shared secret and parses verified payloads into
/// [`PaymentEvent`]s.
#[derive(Clone)]
pub struct PaymentGateway {
    signing_secret: String,
}

impl PaymentGateway {
    /// Creates a gateway with the given shared signing secret.
    pub fn new(signing_secret: impl Into<String>) -> Self {
        PaymentGateway {
            signing_secret: signing_secret.into(),
        }
    }

    /// Verifies the signature header against the raw payload.
    ///
    /// Constant-time comparison via `Mac::verify_slice`; any failure mode
    /// (bad hex, wrong length, wrong MAC) collapses into
    /// [`SettleError::Auth`] so callers cannot distinguish them.
    pub fn verify(&self, raw: &[u8], signature_hex: &str) -> SettleResult<()> {
        let signature = hex::decode(signature_hex.trim())
            .map_err(|_| SettleError::Auth("signature is not valid hex".to_string()))?;

        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|e| SettleError::Auth(format!("invalid secret length: {}", e)))?;
        mac.update(raw);

        mac.verify_slice(&signature)
            .map_err(|_| SettleError::Auth("signature mismatch".to_string()))
    }

    /// Parses a (verified) raw payload into a payment event.
    ///
    /// Structural parse only: field-level validation is the processor's
    /// concern, and only for events that actually drive settlement.
    pub fn parse(&self, raw: &[u8]) -> SettleResult<PaymentEvent> {
        let wire: WireEvent = serde_json::from_slice(raw)
            .map_err(|e| SettleError::MalformedEvent(e.to_string()))?;

        Ok(PaymentEvent {
            external_id: wire.id,
            kind: PaymentEventKind::parse(&wire.kind),
            amount: wire.amount,
            currency: wire.currency,
            payer_email: wire.payer_email,
        })
    }

    /// Verifies then parses in one step.
    pub fn verify_and_parse(&self, raw: &[u8], signature_hex: &str) -> SettleResult<PaymentEvent> {
        self.verify(raw, signature_hex)?;
        self.parse(raw)
    }

    /// Computes the hex signature for a payload.
    ///
    /// What the gateway side does before delivery; used by tests and local
    /// tooling to produce valid webhook requests.
    pub fn sign(&self, raw: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(raw);
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret
        f.debug_struct("PaymentGateway").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn event_json(id: &str, kind: &str) -> Vec<u8> {
        format!(
            r#"{{"id":"{}","type":"{}","amount":1000,"currency":"USD","payer_email":"buyer@example.com"}}"#,
            id, kind
        )
        .into_bytes()
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let gateway = PaymentGateway::new(SECRET);
        let raw = event_json("evt_1", "charge.succeeded");
        let signature = gateway.sign(&raw);

        assert!(gateway.verify(&raw, &signature).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let gateway = PaymentGateway::new(SECRET);
        let other = PaymentGateway::new("whsec_other");
        let raw = event_json("evt_1", "charge.succeeded");

        let signature = other.sign(&raw);
        assert!(matches!(
            gateway.verify(&raw, &signature),
            Err(SettleError::Auth(_))
        ));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let gateway = PaymentGateway::new(SECRET);
        let raw = event_json("evt_1", "charge.succeeded");
        let signature = gateway.sign(&raw);

        let tampered = event_json("evt_1", "charge.refunded");
        assert!(gateway.verify(&tampered, &signature).is_err());
    }

    #[test]
    fn test_verify_rejects_garbage_signature() {
        let gateway = PaymentGateway::new(SECRET);
        let raw = event_json("evt_1", "charge.succeeded");

        assert!(gateway.verify(&raw, "not-hex-at-all").is_err());
        assert!(gateway.verify(&raw, "deadbeef").is_err());
    }

    #[test]
    fn test_parse_classifies_kind() {
        let gateway = PaymentGateway::new(SECRET);

        let event = gateway.parse(&event_json("evt_1", "charge.succeeded")).unwrap();
        assert_eq!(event.external_id, "evt_1");
        assert!(event.kind.is_charge_succeeded());
        assert_eq!(event.amount, 1000);
        assert_eq!(event.currency, "USD");

        let event = gateway.parse(&event_json("evt_2", "customer.created")).unwrap();
        assert!(!event.kind.is_charge_succeeded());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let gateway = PaymentGateway::new(SECRET);
        assert!(matches!(
            gateway.parse(b"<not json>"),
            Err(SettleError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let gateway = PaymentGateway::new(SECRET);
        let debug = format!("{:?}", gateway);
        assert!(!debug.contains(SECRET));
    }
}
