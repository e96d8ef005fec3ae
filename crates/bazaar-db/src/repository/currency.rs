//! # Currency Repository (the Rate Store)
//!
//! Holds the latest known exchange rate per tracked currency code.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rate Store Access Pattern                          │
//! │                                                                         │
//! │  Rate Synchronizer ──── apply_rates() ──── ONLY writer of `rate`       │
//! │                                            (single transaction,         │
//! │                                             all-or-nothing)             │
//! │                                                                         │
//! │  Request handlers ───── snapshot() ─────── read a consistent set       │
//! │  Settlement engine ──── list_all() ─────── of rates once per call      │
//! │                                                                         │
//! │  Codes absent from a provider response keep their previous rate        │
//! │  (stale-but-available); rows are never deleted in normal operation.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::rates::RateSnapshot;
use bazaar_core::types::Currency;

/// Repository for currency rows and rate snapshots.
#[derive(Debug, Clone)]
pub struct CurrencyRepository {
    pool: SqlitePool,
}

impl CurrencyRepository {
    /// Creates a new CurrencyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CurrencyRepository { pool }
    }

    /// Lists all tracked currencies in code order.
    pub async fn list_all(&self) -> DbResult<Vec<Currency>> {
        let currencies = sqlx::query_as::<_, Currency>(
            r#"
            SELECT code, symbol, rate, updated_at, created_at
            FROM currencies
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(currencies)
    }

    /// Gets a currency by code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Currency>> {
        let currency = sqlx::query_as::<_, Currency>(
            r#"
            SELECT code, symbol, rate, updated_at, created_at
            FROM currencies
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(currency)
    }

    /// Starts tracking a new currency with no rate yet.
    ///
    /// The rate stays `NULL` (and the code unresolved in price maps) until
    /// the next synchronizer run supplies a value.
    pub async fn track(&self, code: &str, symbol: &str) -> DbResult<Currency> {
        let now = Utc::now();

        debug!(code = %code, "Tracking currency");

        let currency = Currency {
            code: code.to_string(),
            symbol: symbol.to_string(),
            rate: None,
            updated_at: None,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO currencies (code, symbol, rate, updated_at, created_at)
            VALUES (?1, ?2, NULL, NULL, ?3)
            "#,
        )
        .bind(&currency.code)
        .bind(&currency.symbol)
        .bind(currency.created_at)
        .execute(&self.pool)
        .await?;

        Ok(currency)
    }

    /// Returns the codes of all tracked currencies.
    pub async fn tracked_codes(&self) -> DbResult<Vec<String>> {
        let codes: Vec<String> =
            sqlx::query_scalar("SELECT code FROM currencies ORDER BY code")
                .fetch_all(&self.pool)
                .await?;

        Ok(codes)
    }

    /// Overwrites rates for the given codes in one transaction.
    ///
    /// ## Contract (Rate Synchronizer write path)
    /// - Only codes already tracked AND present in `table` are updated;
    ///   everything else is left untouched (stale-but-available).
    /// - All updates land in a single transaction: a failure part-way
    ///   through modifies no row at all.
    ///
    /// Returns the number of rows updated.
    pub async fn apply_rates(&self, table: &BTreeMap<String, i64>) -> DbResult<usize> {
        if table.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut updated = 0usize;
        for (code, rate) in table {
            let result = sqlx::query(
                r#"
                UPDATE currencies
                SET rate = ?2, updated_at = ?3
                WHERE code = ?1
                "#,
            )
            .bind(code)
            .bind(rate)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            updated += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(updated, "Applied rate table");

        Ok(updated)
    }

    /// Builds a rate snapshot for price resolution.
    ///
    /// Returns the full list of tracked codes (the "requested" set for the
    /// resolver) plus a snapshot containing only the initialized rates.
    /// Taken in a single query so the snapshot is internally consistent.
    pub async fn snapshot(&self) -> DbResult<(Vec<String>, RateSnapshot)> {
        let rows: Vec<(String, Option<i64>)> =
            sqlx::query_as("SELECT code, rate FROM currencies ORDER BY code")
                .fetch_all(&self.pool)
                .await?;

        let mut codes = Vec::with_capacity(rows.len());
        let mut snapshot = RateSnapshot::new();

        for (code, rate) in rows {
            if let Some(rate) = rate {
                snapshot.set(code.clone(), rate);
            }
            codes.push(code);
        }

        Ok((codes, snapshot))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_track_and_list() {
        let db = test_db().await;
        db.currencies().track("USD", "$").await.unwrap();
        db.currencies().track("EUR", "€").await.unwrap();

        let all = db.currencies().list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].code, "EUR");
        assert_eq!(all[1].code, "USD");
        assert!(all.iter().all(|c| c.rate.is_none()));
    }

    #[tokio::test]
    async fn test_track_duplicate_code_rejected() {
        let db = test_db().await;
        db.currencies().track("USD", "$").await.unwrap();

        let err = db.currencies().track("USD", "$").await.unwrap_err();
        assert!(err.is_unique_violation() || matches!(err, DbError::QueryFailed(_)));
    }

    #[tokio::test]
    async fn test_apply_rates_updates_only_present_codes() {
        let db = test_db().await;
        let repo = db.currencies();
        repo.track("USD", "$").await.unwrap();
        repo.track("EUR", "€").await.unwrap();

        // First sync initializes both
        let mut table = BTreeMap::new();
        table.insert("USD".to_string(), 100);
        table.insert("EUR".to_string(), 92);
        assert_eq!(repo.apply_rates(&table).await.unwrap(), 2);

        // Second sync omits EUR: it must keep its previous value
        let mut partial = BTreeMap::new();
        partial.insert("USD".to_string(), 101);
        assert_eq!(repo.apply_rates(&partial).await.unwrap(), 1);

        let eur = repo.get_by_code("EUR").await.unwrap().unwrap();
        assert_eq!(eur.rate, Some(92));
        let usd = repo.get_by_code("USD").await.unwrap().unwrap();
        assert_eq!(usd.rate, Some(101));
    }

    #[tokio::test]
    async fn test_apply_rates_ignores_untracked_codes() {
        let db = test_db().await;
        let repo = db.currencies();
        repo.track("USD", "$").await.unwrap();

        let mut table = BTreeMap::new();
        table.insert("USD".to_string(), 100);
        table.insert("JPY".to_string(), 14930);
        // JPY is not tracked: one row updated, no row invented
        assert_eq!(repo.apply_rates(&table).await.unwrap(), 1);
        assert!(repo.get_by_code("JPY").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_splits_initialized_and_not() {
        let db = test_db().await;
        let repo = db.currencies();
        repo.track("USD", "$").await.unwrap();
        repo.track("GBP", "£").await.unwrap();

        let mut table = BTreeMap::new();
        table.insert("USD".to_string(), 100);
        repo.apply_rates(&table).await.unwrap();

        let (codes, snapshot) = repo.snapshot().await.unwrap();
        assert_eq!(codes, vec!["GBP".to_string(), "USD".to_string()]);
        assert_eq!(snapshot.get("USD"), Some(100));
        assert_eq!(snapshot.get("GBP"), None);
    }
}
