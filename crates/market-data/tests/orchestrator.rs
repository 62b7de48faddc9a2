//! End-to-end orchestrator behavior against a scripted provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use marketpulse_market_data::simulation::max_abs_delta;
use marketpulse_market_data::{
    MarketCatalog, MarketSpec, MemorySnapshotStore, OrchestratorConfig, Quote, QuoteError,
    QuoteOrchestrator, QuoteProvider, QuoteSource, Snapshot, SnapshotStore,
};

/// Scripted upstream behavior.
#[derive(Clone, Copy)]
enum Mode {
    Success,
    Fail,
    RateLimited,
    /// First call succeeds, every later call fails.
    FailAfterFirst,
}

struct MockProvider {
    mode: Mutex<Mode>,
    calls: AtomicUsize,
    delay: Duration,
}

impl MockProvider {
    fn new(mode: Mode) -> Arc<Self> {
        Self::with_delay(mode, Duration::ZERO)
    }

    fn with_delay(mode: Mode, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for MockProvider {
    fn id(&self) -> &'static str {
        "MOCK"
    }

    async fn fetch_quote(&self, market: &str, symbol: &str) -> Result<Quote, QuoteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mode = *self.mode.lock().unwrap();
        match mode {
            Mode::Success => Ok(Quote::new(
                symbol.to_string(),
                250.0,
                market.to_string(),
                QuoteSource::Real,
            )),
            Mode::Fail => Err(QuoteError::UpstreamFailed("connection refused".to_string())),
            Mode::RateLimited => Err(QuoteError::RateLimited),
            Mode::FailAfterFirst => {
                if call == 0 {
                    Ok(Quote::new(
                        symbol.to_string(),
                        250.0,
                        market.to_string(),
                        QuoteSource::Real,
                    ))
                } else {
                    Err(QuoteError::UpstreamFailed("connection reset".to_string()))
                }
            }
        }
    }
}

fn test_catalog() -> MarketCatalog {
    let mut catalog = MarketCatalog::new();
    catalog.insert(
        "crypto",
        MarketSpec::new(1.0, &[("BTC", 68000.0), ("ETH", 3500.0)]),
    );
    catalog
}

/// Large budget keeps the inter-symbol throttle at 1 ms in tests.
fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        freshness_window: Duration::from_secs(15),
        requests_per_minute: 60_000,
    }
}

fn build(
    provider: Arc<MockProvider>,
) -> (Arc<QuoteOrchestrator>, Arc<MemorySnapshotStore>) {
    let store = Arc::new(MemorySnapshotStore::new(Duration::from_secs(300)));
    let orchestrator = Arc::new(QuoteOrchestrator::new(
        provider,
        store.clone(),
        test_catalog(),
        fast_config(),
    ));
    (orchestrator, store)
}

fn cached_quote(symbol: &str, price: f64) -> Quote {
    Quote::new(
        symbol.to_string(),
        price,
        "crypto".to_string(),
        QuoteSource::Real,
    )
}

#[tokio::test]
async fn successful_fetch_returns_real_quotes_and_caches() {
    let provider = MockProvider::new(Mode::Success);
    let (orchestrator, store) = build(provider.clone());

    let quotes = orchestrator.get_quotes("crypto").await;

    assert_eq!(quotes.len(), 2);
    assert!(quotes.iter().all(|q| q.source == QuoteSource::Real));
    assert_eq!(quotes[0].symbol, "BTC");
    assert_eq!(quotes[1].symbol, "ETH");
    assert_eq!(provider.calls(), 2);
    assert!(store.get("market-crypto").await.is_some());
}

#[tokio::test]
async fn repeat_within_freshness_window_skips_upstream() {
    let provider = MockProvider::new(Mode::Success);
    let (orchestrator, _store) = build(provider.clone());

    let first = orchestrator.get_quotes("crypto").await;
    let second = orchestrator.get_quotes("crypto").await;

    assert_eq!(provider.calls(), 2);
    let pairs: Vec<_> = first.iter().zip(&second).collect();
    assert_eq!(pairs.len(), 2);
    for (a, b) in pairs {
        assert_eq!(a.symbol, b.symbol);
        assert_eq!(a.price, b.price);
        assert_eq!(a.source, b.source);
    }
}

#[tokio::test]
async fn fresh_snapshot_served_verbatim() {
    let provider = MockProvider::new(Mode::Success);
    let (orchestrator, store) = build(provider.clone());

    let snapshot = Snapshot::captured(
        Utc::now() - chrono::Duration::seconds(5),
        vec![cached_quote("BTC", 123.456)],
    );
    store.set("market-crypto", &snapshot).await;

    let quotes = orchestrator.get_quotes("crypto").await;
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].price, 123.456);
    assert_eq!(quotes[0].source, QuoteSource::Real);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn stale_snapshot_simulated_within_bound() {
    let provider = MockProvider::new(Mode::Success);
    let (orchestrator, store) = build(provider.clone());

    let snapshot = Snapshot::captured(
        Utc::now() - chrono::Duration::seconds(20),
        vec![cached_quote("BTC", 123.456)],
    );
    store.set("market-crypto", &snapshot).await;

    let quotes = orchestrator.get_quotes("crypto").await;
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].source, QuoteSource::Simulated);
    assert!((quotes[0].price - 123.456).abs() <= max_abs_delta(123.456) + 1e-6);
    // stale service does not trigger a refresh
    assert_eq!(provider.calls(), 0);

    // and does not mutate the cached snapshot
    let cached = store.get("market-crypto").await.unwrap();
    assert_eq!(cached.quotes[0].price, 123.456);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_coalesce_into_one_fetch() {
    let provider = MockProvider::with_delay(Mode::Success, Duration::from_millis(100));
    let (orchestrator, _store) = build(provider.clone());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let orchestrator = orchestrator.clone();
        handles.push(tokio::spawn(
            async move { orchestrator.get_quotes("crypto").await },
        ));
    }

    for handle in handles {
        let quotes = handle.await.unwrap();
        assert_eq!(quotes.len(), 2);
    }
    // one sweep of two symbols, not eight
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn upstream_failure_without_cache_yields_mock() {
    let provider = MockProvider::new(Mode::Fail);
    let (orchestrator, store) = build(provider.clone());

    let quotes = orchestrator.get_quotes("crypto").await;

    assert_eq!(quotes.len(), 2);
    assert!(quotes.iter().all(|q| q.source == QuoteSource::Mock));
    // first symbol failure aborts the sweep
    assert_eq!(provider.calls(), 1);
    // the fallback is cached to prevent a stampede of failing fetches
    assert!(store.get("market-crypto").await.is_some());
}

#[tokio::test]
async fn rate_limited_without_cache_yields_mock_near_baseline() {
    let provider = MockProvider::new(Mode::RateLimited);
    let (orchestrator, _store) = build(provider.clone());

    let quotes = orchestrator.get_quotes("crypto").await;

    assert_eq!(quotes.len(), 2);
    for quote in &quotes {
        assert_eq!(quote.source, QuoteSource::Mock);
        let baseline = match quote.symbol.as_str() {
            "BTC" => 68000.0,
            "ETH" => 3500.0,
            other => panic!("unexpected symbol {}", other),
        };
        assert!((quote.price - baseline).abs() <= baseline * 0.012 + 1e-6);
    }
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn cached_fallback_prevents_repeated_failing_fetches() {
    let provider = MockProvider::new(Mode::Fail);
    let (orchestrator, _store) = build(provider.clone());

    orchestrator.get_quotes("crypto").await;
    assert_eq!(provider.calls(), 1);

    for _ in 0..5 {
        let quotes = orchestrator.get_quotes("crypto").await;
        assert!(!quotes.is_empty());
    }
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn single_symbol_failure_aborts_whole_sweep() {
    let provider = MockProvider::new(Mode::FailAfterFirst);
    let (orchestrator, _store) = build(provider.clone());

    let quotes = orchestrator.get_quotes("crypto").await;

    // the successfully fetched first symbol is discarded with the rest
    assert_eq!(provider.calls(), 2);
    assert!(quotes.iter().all(|q| q.source == QuoteSource::Mock));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_fetch_falls_back_to_snapshot_written_meanwhile() {
    let provider = MockProvider::with_delay(Mode::Fail, Duration::from_millis(200));
    let (orchestrator, store) = build(provider.clone());

    let task = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.get_quotes("crypto").await })
    };

    // another process instance writes a stale snapshot mid-fetch
    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = Snapshot::captured(
        Utc::now() - chrono::Duration::seconds(20),
        vec![cached_quote("BTC", 500.0)],
    );
    store.set("market-crypto", &snapshot).await;

    let quotes = task.await.unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].source, QuoteSource::Simulated);
    assert!((quotes[0].price - 500.0).abs() <= max_abs_delta(500.0) + 1e-6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn waiters_observe_fallback_snapshot() {
    let provider = MockProvider::with_delay(Mode::RateLimited, Duration::from_millis(100));
    let (orchestrator, _store) = build(provider.clone());

    let mut handles = Vec::new();
    for _ in 0..2 {
        let orchestrator = orchestrator.clone();
        handles.push(tokio::spawn(
            async move { orchestrator.get_quotes("crypto").await },
        ));
    }

    for handle in handles {
        let quotes = handle.await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert!(quotes.iter().all(|q| q.source != QuoteSource::Real));
    }
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn unknown_market_yields_empty_set() {
    let provider = MockProvider::new(Mode::Success);
    let (orchestrator, _store) = build(provider.clone());

    let quotes = orchestrator.get_quotes("commodities").await;
    assert!(quotes.is_empty());
    assert_eq!(provider.calls(), 0);
}
