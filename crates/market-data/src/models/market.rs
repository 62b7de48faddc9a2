//! Static market configuration: symbol tables, volatility
//! multipliers, and baseline prices.

use std::collections::HashMap;

/// Market served when a request does not name one.
pub const DEFAULT_MARKET: &str = "crypto";

/// Volatility multiplier for markets not in the catalog.
pub const DEFAULT_VOLATILITY: f64 = 1.0;

/// Baseline price for symbols with no configured baseline.
pub const DEFAULT_BASELINE_PRICE: f64 = 100.0;

/// Configuration for one market.
#[derive(Clone, Debug)]
pub struct MarketSpec {
    /// Symbols fetched for this market, in fetch order.
    pub symbols: Vec<String>,

    /// Volatility multiplier applied by the simulation model.
    pub volatility: f64,

    /// Baseline price per symbol, used by the mock generator.
    pub baselines: HashMap<String, f64>,
}

impl MarketSpec {
    /// Build a spec from `(symbol, baseline price)` pairs.
    pub fn new(volatility: f64, entries: &[(&str, f64)]) -> Self {
        Self {
            symbols: entries.iter().map(|(s, _)| s.to_string()).collect(),
            volatility,
            baselines: entries
                .iter()
                .map(|(s, p)| (s.to_string(), *p))
                .collect(),
        }
    }
}

/// Injected configuration data: the symbol-to-market table plus the
/// per-market tuning the simulation and mock layers read.
#[derive(Clone, Debug, Default)]
pub struct MarketCatalog {
    markets: HashMap<String, MarketSpec>,
}

impl MarketCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in market table.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert(
            "crypto",
            MarketSpec::new(
                1.0,
                &[("BTC", 68000.0), ("ETH", 3500.0), ("SOL", 150.0)],
            ),
        );
        catalog.insert(
            "fx",
            MarketSpec::new(
                0.3,
                &[("EURUSD", 1.08), ("GBPUSD", 1.27), ("USDJPY", 151.5)],
            ),
        );
        catalog.insert(
            "stocks",
            MarketSpec::new(
                0.4,
                &[("AAPL", 190.0), ("MSFT", 410.0), ("NVDA", 880.0)],
            ),
        );
        catalog.insert(
            "indices",
            MarketSpec::new(0.2, &[("SPX", 5200.0), ("DJI", 39000.0)]),
        );
        catalog
    }

    /// Add or replace a market.
    pub fn insert(&mut self, name: &str, spec: MarketSpec) {
        self.markets.insert(name.to_string(), spec);
    }

    /// Configured market names, sorted.
    pub fn market_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.markets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Symbols for a market. Empty for unknown markets.
    pub fn symbols(&self, market: &str) -> &[String] {
        self.markets
            .get(market)
            .map(|spec| spec.symbols.as_slice())
            .unwrap_or(&[])
    }

    /// Volatility multiplier for a market.
    pub fn volatility(&self, market: &str) -> f64 {
        self.markets
            .get(market)
            .map(|spec| spec.volatility)
            .unwrap_or(DEFAULT_VOLATILITY)
    }

    /// Baseline price for a symbol in a market.
    pub fn baseline_price(&self, market: &str, symbol: &str) -> f64 {
        self.markets
            .get(market)
            .and_then(|spec| spec.baselines.get(symbol).copied())
            .unwrap_or(DEFAULT_BASELINE_PRICE)
    }

    /// Cache key for a market's snapshot. One snapshot per key.
    pub fn cache_key(market: &str) -> String {
        format!("market-{}", market)
    }
}
