//! # Exchange-Rate Provider Client
//!
//! Fetches the latest rate table from the external provider.
//!
//! ## Response Contract
//! ```text
//! GET <provider.url>                      (apikey header)
//!
//! 200 OK
//! { "rates": { "USD": 1.0, "EUR": 0.92, "JPY": 149.3, ... } }
//! ```
//!
//! Values are decimal rates (units of local currency per base unit); they
//! are converted to the stored scaled-integer form here, at the boundary,
//! so everything downstream works in exact integers. Any shape violation
//! (missing `rates`, non-finite or negative value, malformed code) fails
//! the WHOLE fetch: the synchronizer applies either a fully valid table or
//! nothing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::ProviderSettings;
use crate::error::{SettleError, SettleResult};
use bazaar_core::validation::validate_currency_code;
use bazaar_core::RATE_SCALE;

/// Largest decimal rate the scaled-i64 representation accepts.
/// Far beyond any real currency pair; guards the f64→i64 conversion.
const MAX_RATE: f64 = 1e15;

// =============================================================================
// Provider Trait
// =============================================================================

/// Source of exchange-rate tables.
///
/// The seam between the synchronizer and the outside world: production
/// uses [`HttpRateProvider`], tests substitute a canned implementation.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches the current rate table, already validated and scaled.
    ///
    /// Implementations must be all-or-nothing: either every entry in the
    /// returned map is a finite, non-negative scaled rate, or the call
    /// fails and the caller mutates nothing.
    async fn fetch_rates(&self) -> SettleResult<BTreeMap<String, i64>>;
}

// =============================================================================
// Wire Types
// =============================================================================

/// The provider's JSON response body.
#[derive(Debug, Deserialize)]
struct RateTableResponse {
    rates: BTreeMap<String, f64>,
}

// =============================================================================
// HTTP Provider
// =============================================================================

/// Production rate provider speaking HTTP+JSON.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpRateProvider {
    /// Creates a provider client from settings.
    ///
    /// The request timeout is baked into the client so no fetch can hang
    /// the synchronizer's schedule.
    pub fn new(settings: &ProviderSettings) -> SettleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| SettleError::Provider(e.to_string()))?;

        Ok(HttpRateProvider {
            client,
            url: settings.url.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Converts one decimal rate to the scaled-integer form.
    ///
    /// `scaled = round(rate × 100)`, so `price × scaled / 100` downstream
    /// yields target minor units. Rejects non-finite and negative values;
    /// zero is accepted (a currency the provider quotes as worthless is
    /// data, not a protocol violation).
    fn scale_rate(code: &str, rate: f64) -> SettleResult<i64> {
        if !rate.is_finite() {
            return Err(SettleError::MalformedResponse(format!(
                "rate for {} is not finite",
                code
            )));
        }

        if rate < 0.0 {
            return Err(SettleError::MalformedResponse(format!(
                "rate for {} is negative: {}",
                code, rate
            )));
        }

        if rate > MAX_RATE {
            return Err(SettleError::MalformedResponse(format!(
                "rate for {} is out of range: {}",
                code, rate
            )));
        }

        Ok((rate * RATE_SCALE as f64).round() as i64)
    }

    /// Validates and scales a decoded response into the stored form.
    fn convert_table(response: RateTableResponse) -> SettleResult<BTreeMap<String, i64>> {
        let mut table = BTreeMap::new();

        for (code, rate) in response.rates {
            validate_currency_code(&code).map_err(|e| {
                SettleError::MalformedResponse(format!("bad currency code '{}': {}", code, e))
            })?;

            table.insert(code.clone(), Self::scale_rate(&code, rate)?);
        }

        Ok(table)
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_rates(&self) -> SettleResult<BTreeMap<String, i64>> {
        debug!(url = %self.url, "Fetching rate table");

        let response = self
            .client
            .get(&self.url)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| SettleError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SettleError::Provider(format!(
                "provider returned {}",
                status
            )));
        }

        let body: RateTableResponse = response
            .json()
            .await
            .map_err(|e| SettleError::MalformedResponse(e.to_string()))?;

        let table = Self::convert_table(body)?;

        debug!(codes = table.len(), "Fetched rate table");
        Ok(table)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_rate() {
        assert_eq!(HttpRateProvider::scale_rate("USD", 1.0).unwrap(), 100);
        assert_eq!(HttpRateProvider::scale_rate("EUR", 0.92).unwrap(), 92);
        assert_eq!(HttpRateProvider::scale_rate("JPY", 149.3).unwrap(), 14930);
        assert_eq!(HttpRateProvider::scale_rate("XXX", 0.0).unwrap(), 0);
        // Rounds, never truncates
        assert_eq!(HttpRateProvider::scale_rate("YYY", 0.925).unwrap(), 93);
    }

    #[test]
    fn test_scale_rate_rejects_bad_values() {
        assert!(HttpRateProvider::scale_rate("USD", f64::NAN).is_err());
        assert!(HttpRateProvider::scale_rate("USD", f64::INFINITY).is_err());
        assert!(HttpRateProvider::scale_rate("USD", -0.5).is_err());
        assert!(HttpRateProvider::scale_rate("USD", 1e16).is_err());
    }

    #[test]
    fn test_convert_table_valid() {
        let response: RateTableResponse =
            serde_json::from_str(r#"{ "rates": { "USD": 1.0, "EUR": 0.92 } }"#).unwrap();
        let table = HttpRateProvider::convert_table(response).unwrap();
        assert_eq!(table.get("USD"), Some(&100));
        assert_eq!(table.get("EUR"), Some(&92));
    }

    #[test]
    fn test_convert_table_one_bad_entry_fails_whole_table() {
        let response: RateTableResponse =
            serde_json::from_str(r#"{ "rates": { "USD": 1.0, "EUR": -0.92 } }"#).unwrap();
        assert!(HttpRateProvider::convert_table(response).is_err());
    }

    #[test]
    fn test_convert_table_bad_code_fails() {
        let response: RateTableResponse =
            serde_json::from_str(r#"{ "rates": { "usd": 1.0 } }"#).unwrap();
        assert!(HttpRateProvider::convert_table(response).is_err());
    }

    #[test]
    fn test_missing_rates_key_is_parse_error() {
        let parsed: Result<RateTableResponse, _> =
            serde_json::from_str(r#"{ "quotes": { "USD": 1.0 } }"#);
        assert!(parsed.is_err());
    }
}
