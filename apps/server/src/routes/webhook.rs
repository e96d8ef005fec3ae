//! # Payment Webhook
//!
//! `POST /webhooks/payment` - the single inbound endpoint for signed
//! payment-gateway events.
//!
//! ## Acknowledgement Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Outcome / error                      HTTP status                       │
//! │  ──────────────────────────────────   ───────────────────────────────   │
//! │  missing/bad signature (Rejected)     401  gateway must re-sign         │
//! │  malformed / invalid event            400  redelivery cannot help       │
//! │  Ignored (other event type)           200  acknowledged, no effects     │
//! │  AlreadyProcessed (duplicate)         200  replay absorbed              │
//! │  Unfulfillable (unknown payer)        200  + operator-visible error     │
//! │  Finalized                            200  order created, cart cleared  │
//! │  persistence failure mid-settlement   500  gateway redelivers; the      │
//! │                                            idempotency key makes the    │
//! │                                            retry safe                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The raw body is handed to the processor UNPARSED: signature
//! verification must run over exactly the bytes the gateway signed.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use bazaar_settle::{Outcome, SIGNATURE_HEADER};

use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;

/// Receives one signed gateway delivery.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = match headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(signature) => signature,
        None => {
            // Unverifiable payload: same terminal state as a bad signature
            return ApiError::new(ErrorCode::AuthError, "missing signature header")
                .into_response();
        }
    };

    match state.processor.process(&body, signature).await {
        Ok(Outcome::Rejected) => {
            ApiError::new(ErrorCode::AuthError, "signature verification failed").into_response()
        }
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_state_with_secret, TEST_SECRET};
    use axum::http::HeaderValue;
    use bazaar_settle::PaymentGateway;

    fn headers_with_signature(signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(signature).unwrap(),
        );
        headers
    }

    fn charge_succeeded(id: &str, email: &str) -> Vec<u8> {
        format!(
            r#"{{"id":"{}","type":"charge.succeeded","amount":1000,"currency":"USD","payer_email":"{}"}}"#,
            id, email
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn test_missing_signature_is_401() {
        let state = test_state_with_secret().await;
        let response = receive(
            State(state),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_signature_is_401() {
        let state = test_state_with_secret().await;
        let raw = charge_succeeded("evt_1", "buyer@example.com");
        let response = receive(
            State(state),
            headers_with_signature("deadbeef"),
            Bytes::from(raw),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_delivery_is_200() {
        let state = test_state_with_secret().await;
        state
            .db
            .users()
            .create("buyer@example.com", "Buyer")
            .await
            .unwrap();

        let raw = charge_succeeded("evt_1", "buyer@example.com");
        let signature = PaymentGateway::new(TEST_SECRET).sign(&raw);

        let response = receive(
            State(state),
            headers_with_signature(&signature),
            Bytes::from(raw),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let state = test_state_with_secret().await;
        let raw = b"not json".to_vec();
        let signature = PaymentGateway::new(TEST_SECRET).sign(&raw);

        let response = receive(
            State(state),
            headers_with_signature(&signature),
            Bytes::from(raw),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ignored_type_is_200() {
        let state = test_state_with_secret().await;
        let raw = br#"{"id":"evt_9","type":"customer.created","amount":1,"currency":"USD","payer_email":"x@y.z"}"#.to_vec();
        let signature = PaymentGateway::new(TEST_SECRET).sign(&raw);

        let response = receive(
            State(state),
            headers_with_signature(&signature),
            Bytes::from(raw),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
