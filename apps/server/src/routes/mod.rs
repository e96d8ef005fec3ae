//! # Route Handlers
//!
//! One module per resource, mirroring the external interface surface:
//!
//! - [`webhook`] - `POST /webhooks/payment` (settlement path)
//! - [`currencies`] - `GET /currencies` (Rate Store listing)
//! - [`pricing`] - price resolution and cart totals (read path)
//! - [`orders`] - order history reads

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod currencies;
pub mod orders;
pub mod pricing;
pub mod webhook;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/currencies", get(currencies::list))
        .route("/products/{id}/prices", get(pricing::product_prices))
        .route("/carts/{user_id}/totals", get(pricing::cart_totals))
        .route("/users/{user_id}/orders", get(orders::history))
        .route("/webhooks/payment", post(webhook::receive))
        .with_state(state)
}

/// Liveness + database health.
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::Json<serde_json::Value> {
    let db_ok = state.db.health_check().await;
    axum::Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "database": db_ok,
    }))
}
