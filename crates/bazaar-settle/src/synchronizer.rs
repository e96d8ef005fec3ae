//! # Rate Synchronizer
//!
//! Recurring background task that refreshes the Rate Store from the
//! external provider.
//!
//! ## Scheduling Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Synchronizer Tick Behavior                           │
//! │                                                                         │
//! │  tick ──► sync_once() ─────────────────────► done                      │
//! │                │                                                        │
//! │                │  still running at the next tick?                       │
//! │                ▼                                                        │
//! │  tick ──► SKIPPED (MissedTickBehavior::Skip)                           │
//! │                                                                         │
//! │  • At most one run in flight: the loop awaits sync_once inline,        │
//! │    and missed ticks are skipped, never queued.                          │
//! │  • A failed run logs the error and leaves every rate untouched;        │
//! │    the schedule continues unaffected. Never fatal.                      │
//! │  • Codes absent from the provider response keep their previous         │
//! │    rate (stale-but-available).                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use bazaar_db::Database;

use crate::error::SettleResult;
use crate::provider::RateProvider;

// =============================================================================
// Rate Synchronizer
// =============================================================================

/// Background task refreshing the Rate Store on a fixed period.
pub struct RateSynchronizer {
    /// Database connection (the Rate Store lives behind it).
    db: Database,

    /// Rate source.
    provider: Arc<dyn RateProvider>,

    /// Interval between runs.
    period: Duration,
}

/// Handle for controlling a running synchronizer.
#[derive(Clone)]
pub struct RateSynchronizerHandle {
    /// Shutdown sender.
    shutdown_tx: mpsc::Sender<()>,

    /// Manual trigger sender; carries a reply channel.
    trigger_tx: mpsc::Sender<oneshot::Sender<SettleResult<usize>>>,
}

impl RateSynchronizerHandle {
    /// Signals the synchronizer to shut down gracefully.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }

    /// Runs one synchronization immediately, outside the schedule.
    ///
    /// Serialized with scheduled runs by the same loop, so the at-most-one
    /// in-flight guarantee holds. Returns the number of rate rows updated.
    pub async fn sync_now(&self) -> SettleResult<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();

        if self.trigger_tx.send(reply_tx).await.is_err() {
            return Ok(0); // Synchronizer already stopped
        }

        reply_rx.await.unwrap_or(Ok(0))
    }
}

impl RateSynchronizer {
    /// Creates a synchronizer.
    pub fn new(db: Database, provider: Arc<dyn RateProvider>, period: Duration) -> Self {
        RateSynchronizer {
            db,
            provider,
            period,
        }
    }

    /// Spawns the background loop and returns its handle.
    pub fn spawn(self) -> RateSynchronizerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (trigger_tx, trigger_rx) = mpsc::channel(8);

        tokio::spawn(self.run(shutdown_rx, trigger_rx));

        RateSynchronizerHandle {
            shutdown_tx,
            trigger_tx,
        }
    }

    /// Main loop: tick, trigger, or shutdown.
    async fn run(
        self,
        mut shutdown_rx: mpsc::Receiver<()>,
        mut trigger_rx: mpsc::Receiver<oneshot::Sender<SettleResult<usize>>>,
    ) {
        info!(period_secs = self.period.as_secs(), "Rate synchronizer starting");

        let mut interval = tokio::time::interval(self.period);
        // Skip (don't queue) ticks that fire while a run is in flight
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first interval tick fires immediately: rates initialize at boot
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.sync_once().await {
                        Ok(updated) => {
                            info!(updated, "Rate synchronization complete");
                        }
                        Err(e) => {
                            // Reported, never fatal: rates stay stale and
                            // the schedule continues
                            error!(error = %e, "Rate synchronization failed");
                        }
                    }
                }

                Some(reply) = trigger_rx.recv() => {
                    let result = self.sync_once().await;
                    if let Err(e) = &result {
                        error!(error = %e, "Manual rate synchronization failed");
                    }
                    let _ = reply.send(result);
                }

                _ = shutdown_rx.recv() => {
                    info!("Rate synchronizer shutting down");
                    break;
                }
            }
        }

        info!("Rate synchronizer stopped");
    }

    /// One synchronization run.
    ///
    /// Fetch → validate (inside the provider) → filter to tracked codes →
    /// apply in one transaction. Any failure before `apply_rates` commits
    /// modifies no row.
    pub async fn sync_once(&self) -> SettleResult<usize> {
        let tracked = self.db.currencies().tracked_codes().await?;

        if tracked.is_empty() {
            debug!("No currencies tracked, nothing to sync");
            return Ok(0);
        }

        let table = self.provider.fetch_rates().await?;

        // Only tracked codes are applied; unknown provider codes are
        // ignored, tracked codes absent from the response stay stale.
        let filtered: BTreeMap<String, i64> = table
            .into_iter()
            .filter(|(code, _)| tracked.contains(code))
            .collect();

        if filtered.is_empty() {
            debug!("Provider response contained no tracked codes");
            return Ok(0);
        }

        let updated = self.db.currencies().apply_rates(&filtered).await?;
        Ok(updated)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SettleError;
    use async_trait::async_trait;
    use bazaar_db::{Database, DbConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned provider: either a fixed table or a fixed failure.
    struct FixedProvider {
        table: Option<BTreeMap<String, i64>>,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn ok(entries: &[(&str, i64)]) -> Arc<Self> {
            Arc::new(FixedProvider {
                table: Some(
                    entries
                        .iter()
                        .map(|(c, r)| (c.to_string(), *r))
                        .collect(),
                ),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(FixedProvider {
                table: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RateProvider for FixedProvider {
        async fn fetch_rates(&self) -> SettleResult<BTreeMap<String, i64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.table {
                Some(table) => Ok(table.clone()),
                None => Err(SettleError::Provider("connection timed out".to_string())),
            }
        }
    }

    async fn db_with_currencies() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.currencies().track("USD", "$").await.unwrap();
        db.currencies().track("EUR", "€").await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_sync_once_applies_tracked_rates() {
        let db = db_with_currencies().await;
        let provider = FixedProvider::ok(&[("USD", 100), ("EUR", 92), ("JPY", 14930)]);
        let sync = RateSynchronizer::new(db.clone(), provider, Duration::from_secs(3000));

        // JPY is untracked: only the two tracked codes update
        assert_eq!(sync.sync_once().await.unwrap(), 2);

        let usd = db.currencies().get_by_code("USD").await.unwrap().unwrap();
        assert_eq!(usd.rate, Some(100));
        assert!(usd.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_sync_once_partial_response_leaves_missing_code_stale() {
        let db = db_with_currencies().await;

        let full = FixedProvider::ok(&[("USD", 100), ("EUR", 92)]);
        RateSynchronizer::new(db.clone(), full, Duration::from_secs(3000))
            .sync_once()
            .await
            .unwrap();

        // Next run the provider dropped EUR entirely
        let partial = FixedProvider::ok(&[("USD", 105)]);
        RateSynchronizer::new(db.clone(), partial, Duration::from_secs(3000))
            .sync_once()
            .await
            .unwrap();

        let eur = db.currencies().get_by_code("EUR").await.unwrap().unwrap();
        assert_eq!(eur.rate, Some(92), "EUR must keep its stale rate");
        let usd = db.currencies().get_by_code("USD").await.unwrap().unwrap();
        assert_eq!(usd.rate, Some(105));
    }

    #[tokio::test]
    async fn test_sync_once_provider_failure_mutates_nothing() {
        let db = db_with_currencies().await;

        let full = FixedProvider::ok(&[("USD", 100), ("EUR", 92)]);
        RateSynchronizer::new(db.clone(), full, Duration::from_secs(3000))
            .sync_once()
            .await
            .unwrap();

        let failing = FixedProvider::failing();
        let sync = RateSynchronizer::new(db.clone(), failing, Duration::from_secs(3000));
        assert!(sync.sync_once().await.is_err());

        for (code, rate) in [("USD", 100), ("EUR", 92)] {
            let row = db.currencies().get_by_code(code).await.unwrap().unwrap();
            assert_eq!(row.rate, Some(rate), "{code} must be untouched");
        }
    }

    #[tokio::test]
    async fn test_sync_once_no_tracked_currencies_skips_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let provider = FixedProvider::ok(&[("USD", 100)]);
        let sync =
            RateSynchronizer::new(db.clone(), provider.clone(), Duration::from_secs(3000));

        assert_eq!(sync.sync_once().await.unwrap(), 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_spawned_loop_survives_failures_and_shuts_down() {
        let db = db_with_currencies().await;
        let failing = FixedProvider::failing();
        let handle =
            RateSynchronizer::new(db.clone(), failing, Duration::from_secs(3000)).spawn();

        // A manual run fails but the loop stays alive for the next call
        assert!(handle.sync_now().await.is_err());
        assert!(handle.sync_now().await.is_err());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sync_now_applies_rates() {
        let db = db_with_currencies().await;
        let provider = FixedProvider::ok(&[("USD", 100), ("EUR", 92)]);
        let handle =
            RateSynchronizer::new(db.clone(), provider, Duration::from_secs(3000)).spawn();

        assert_eq!(handle.sync_now().await.unwrap(), 2);
        handle.shutdown().await;
    }
}
