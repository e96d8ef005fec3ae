//! # Currency Listing
//!
//! `GET /currencies` - all tracked currency rows, sourced from the Rate
//! Store at request time.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use bazaar_core::types::Currency;

use crate::error::ApiError;
use crate::state::AppState;

/// One tracked currency as exposed over the API.
#[derive(Debug, Serialize)]
pub struct CurrencyDto {
    pub code: String,
    pub symbol: String,
    /// Scaled rate (units per base × 100); null until first sync.
    pub rate: Option<i64>,
    pub updated_at: Option<String>,
}

impl From<Currency> for CurrencyDto {
    fn from(currency: Currency) -> Self {
        CurrencyDto {
            code: currency.code,
            symbol: currency.symbol,
            rate: currency.rate,
            updated_at: currency.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Lists all tracked currencies.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CurrencyDto>>, ApiError> {
    let currencies = state.db.currencies().list_all().await?;
    Ok(Json(currencies.into_iter().map(CurrencyDto::from).collect()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn test_list_serves_rate_store_rows() {
        let state = test_state().await;
        state.db.currencies().track("USD", "$").await.unwrap();

        let Json(currencies) = list(State(state)).await.unwrap();
        assert_eq!(currencies.len(), 1);
        assert_eq!(currencies[0].code, "USD");
        assert_eq!(currencies[0].rate, None);
    }
}
