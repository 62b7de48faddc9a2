//! Per-request quote retrieval orchestration.
//!
//! Composes the snapshot store, the upstream provider, the simulation
//! model, and the baseline generator into the per-request decision
//! flow: serve fresh cache verbatim, simulate stale cache, coalesce
//! concurrent fetches for a key, or fetch upstream with a throttled
//! sequential sweep and fall back to synthetic data on any failure.
//! A request always terminates with a quote sequence; upstream
//! failure never propagates to the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::watch;

use crate::cache::SnapshotStore;
use crate::models::{MarketCatalog, Quote, Snapshot};
use crate::provider::QuoteProvider;
use crate::simulation::{self, baseline};

/// Snapshot age below which cached quotes are served verbatim.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(15);

/// Default upstream requests-per-minute budget (free-tier limit).
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 5;

/// Construction-time orchestrator configuration.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Snapshot age below which cached quotes are served verbatim.
    pub freshness_window: Duration,

    /// Upstream budget; successive symbol calls are spaced
    /// `60000 / requests_per_minute` ms apart.
    pub requests_per_minute: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            freshness_window: FRESHNESS_WINDOW,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
        }
    }
}

/// Outcome of the in-flight check-then-register step.
enum Claimed {
    /// This request owns the fetch; broadcast on the sender when done.
    Owner(watch::Sender<bool>),
    /// Another fetch is in flight; wait on the receiver.
    Waiter(watch::Receiver<bool>),
}

/// The quote retrieval service.
///
/// All mutable process-wide state (in-flight table, in-process cache,
/// the provider's cooldown gate) hangs off this instance, so tests
/// can run independent orchestrators side by side.
pub struct QuoteOrchestrator {
    provider: Arc<dyn QuoteProvider>,
    store: Arc<dyn SnapshotStore>,
    catalog: MarketCatalog,
    config: OrchestratorConfig,
    inflight: Mutex<HashMap<String, watch::Receiver<bool>>>,
}

impl QuoteOrchestrator {
    /// Create an orchestrator over a provider and a snapshot store.
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        store: Arc<dyn SnapshotStore>,
        catalog: MarketCatalog,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            store,
            catalog,
            config,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// The configured market catalog.
    pub fn catalog(&self) -> &MarketCatalog {
        &self.catalog
    }

    /// Backend label of the snapshot store, for health reporting.
    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Get the quote set for a market.
    ///
    /// Always yields a quote sequence; provenance is carried in each
    /// quote's `source` field.
    pub async fn get_quotes(self: &Arc<Self>, market: &str) -> Vec<Quote> {
        let key = MarketCatalog::cache_key(market);

        loop {
            if let Some(quotes) = self.from_cache(&key, market).await {
                return quotes;
            }

            match self.claim(&key) {
                Claimed::Owner(tx) => {
                    info!("Orchestrator: fetching market '{}' upstream", market);
                    let this = Arc::clone(self);
                    let owned_market = market.to_string();
                    let owned_key = key.clone();

                    // Detached so a disconnecting caller cannot cancel
                    // the fetch mid-sweep; the cache write always lands
                    // for the benefit of later callers.
                    let handle = tokio::spawn(async move {
                        let quotes = this.fetch_market(&owned_market, &owned_key).await;
                        this.release(&owned_key);
                        let _ = tx.send(true);
                        quotes
                    });

                    match handle.await {
                        Ok(quotes) => return quotes,
                        Err(err) => {
                            warn!("Orchestrator: fetch task for '{}' failed: {}", market, err);
                            return match self.from_cache(&key, market).await {
                                Some(quotes) => quotes,
                                None => baseline::generate(&self.catalog, market, Utc::now()),
                            };
                        }
                    }
                }
                Claimed::Waiter(mut rx) => {
                    debug!("Orchestrator: awaiting in-flight fetch for '{}'", market);
                    // A closed channel also means the fetch completed.
                    let _ = rx.changed().await;
                }
            }
        }
    }

    /// Serve from the store: fresh snapshots verbatim, stale ones
    /// through the simulation model (without mutating the cache).
    async fn from_cache(&self, key: &str, market: &str) -> Option<Vec<Quote>> {
        let snapshot = self.store.get(key).await?;
        let now = Utc::now();
        let age = snapshot.age_at(now);
        let window = chrono::Duration::from_std(self.config.freshness_window)
            .unwrap_or_else(|_| chrono::Duration::seconds(15));

        if age < window {
            debug!("Orchestrator: '{}' fresh ({}s old)", key, age.num_seconds());
            Some(snapshot.quotes)
        } else {
            debug!(
                "Orchestrator: '{}' stale ({}s old), simulating",
                key,
                age.num_seconds()
            );
            Some(simulation::simulate(
                &snapshot,
                self.catalog.volatility(market),
                now,
            ))
        }
    }

    /// Fetch every configured symbol sequentially, then write the
    /// snapshot. All-or-nothing: the first symbol failure aborts the
    /// sweep and the fallback result is cached instead, so repeated
    /// failing fetches cannot stampede the provider.
    async fn fetch_market(&self, market: &str, key: &str) -> Vec<Quote> {
        let symbols = self.catalog.symbols(market);
        let throttle =
            Duration::from_millis((60_000 / self.config.requests_per_minute.max(1)) as u64);

        let mut quotes = Vec::with_capacity(symbols.len());
        let mut failed = false;

        for (index, symbol) in symbols.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(throttle).await;
            }
            match self.provider.fetch_quote(market, symbol).await {
                Ok(quote) => quotes.push(quote),
                Err(err) => {
                    warn!(
                        "Orchestrator: {} fetch for '{}' failed, aborting market sweep: {}",
                        self.provider.id(),
                        symbol,
                        err
                    );
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            let snapshot = Snapshot::now(quotes);
            self.store.set(key, &snapshot).await;
            return snapshot.quotes;
        }

        // Fallback: evolve whatever snapshot exists (it may have been
        // written by another instance meanwhile), else baseline.
        let now = Utc::now();
        let quotes = match self.store.get(key).await {
            Some(prior) => {
                simulation::simulate(&prior, self.catalog.volatility(market), now)
            }
            None => baseline::generate(&self.catalog, market, now),
        };
        self.store.set(key, &Snapshot::captured(now, quotes.clone())).await;
        quotes
    }

    /// Check-then-register on the in-flight table. The table mutex
    /// makes the pair atomic within this process; coalescing across
    /// process instances stays best-effort.
    fn claim(&self, key: &str) -> Claimed {
        let mut table = self.lock_inflight();
        if let Some(rx) = table.get(key) {
            return Claimed::Waiter(rx.clone());
        }
        let (tx, rx) = watch::channel(false);
        table.insert(key.to_string(), rx);
        Claimed::Owner(tx)
    }

    /// Remove an in-flight entry. Called unconditionally once the
    /// registered operation completes.
    fn release(&self, key: &str) {
        let mut table = self.lock_inflight();
        table.remove(key);
    }

    /// Lock the in-flight table, recovering from poison if necessary.
    /// The worst case of recovery is one duplicate upstream fetch.
    fn lock_inflight(&self) -> MutexGuard<'_, HashMap<String, watch::Receiver<bool>>> {
        self.inflight.lock().unwrap_or_else(|poisoned| {
            warn!("Orchestrator: in-flight table mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.freshness_window, Duration::from_secs(15));
        assert_eq!(config.requests_per_minute, 5);
    }

    #[test]
    fn test_throttle_interval_from_budget() {
        // 5 requests per minute spaces calls 12 seconds apart
        let interval = Duration::from_millis((60_000 / 5u32) as u64);
        assert_eq!(interval, Duration::from_secs(12));
    }
}
