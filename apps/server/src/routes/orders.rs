//! # Order History
//!
//! `GET /users/{user_id}/orders` - settlement records by owner, newest
//! first. Orders are immutable; this is a pure read.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use bazaar_core::types::Order;

use crate::error::ApiError;
use crate::state::AppState;

/// One order as exposed over the API.
#[derive(Debug, Serialize)]
pub struct OrderDto {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub source_event_id: String,
    pub created_at: String,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        OrderDto {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            source_event_id: order.source_event_id,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// Lists a user's orders, newest first.
pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    let user = state
        .db
        .users()
        .get_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", user_id)))?;

    let orders = state.db.orders().list_by_owner(&user.id).await?;
    Ok(Json(orders.into_iter().map(OrderDto::from).collect()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use bazaar_core::types::Order;
    use chrono::Utc;

    #[tokio::test]
    async fn test_history_lists_orders() {
        let state = test_state().await;
        let user = state.db.users().create("a@b.com", "A").await.unwrap();

        let order = Order {
            id: "o1".to_string(),
            owner_id: user.id.clone(),
            amount: 1000,
            currency: "USD".to_string(),
            source_event_id: "evt_1".to_string(),
            created_at: Utc::now(),
        };
        state.db.orders().create(&order, &[]).await.unwrap();

        let Json(history) = history(State(state), Path(user.id)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].source_event_id, "evt_1");
    }

    #[tokio::test]
    async fn test_history_unknown_user_404() {
        let state = test_state().await;
        let err = history(State(state), Path("ghost".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
