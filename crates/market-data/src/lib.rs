//! Marketpulse Market Data Crate
//!
//! Serves near-real-time quote sets per market from a rate-limited
//! upstream provider, masking upstream unavailability behind a
//! cache-backed simulation layer so callers always receive a
//! plausible quote set.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   Orchestrator   |  (per-request decision flow)
//! +------------------+
//!    |           |
//!    v           v
//! +-------+  +----------------+
//! | Cache |  | QuoteProvider  |  (Alpha Vantage, rate guarded)
//! +-------+  +----------------+
//!    |
//!    v
//! +------------------+
//! |   Simulation     |  (stale evolution / mock baseline)
//! +------------------+
//! ```
//!
//! Per request: a fresh snapshot (< 15 s) is served verbatim; a stale
//! one is evolved deterministically within documented bounds; a cache
//! miss triggers one coalesced, throttled upstream sweep; any sweep
//! failure degrades to simulated or baseline data, which is cached in
//! turn. The `source` field on every quote (`real` / `simulated` /
//! `mock`) is the only caller-visible trace of that degradation.
//!
//! # Core Types
//!
//! - [`Quote`] - One symbol's market data snapshot
//! - [`Snapshot`] - Cached quote sequence for one market
//! - [`MarketCatalog`] - Symbol tables, volatility multipliers, baselines
//! - [`QuoteOrchestrator`] - The per-request decision flow
//! - [`SnapshotStore`] - TTL snapshot store (redis or in-process)
//! - [`RateGuard`] - Process-wide upstream cooldown gate

pub mod cache;
pub mod errors;
pub mod guard;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod simulation;

// Re-export all public types from models
pub use models::{
    MarketCatalog, MarketSpec, Quote, QuoteSource, Snapshot, DEFAULT_BASELINE_PRICE,
    DEFAULT_MARKET, DEFAULT_VOLATILITY,
};

// Re-export cache types
pub use cache::{MemorySnapshotStore, RedisSnapshotStore, SnapshotStore, SNAPSHOT_TTL};

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::QuoteProvider;

// Re-export orchestration types
pub use errors::QuoteError;
pub use guard::RateGuard;
pub use orchestrator::{
    OrchestratorConfig, QuoteOrchestrator, DEFAULT_REQUESTS_PER_MINUTE, FRESHNESS_WINDOW,
};
