//! Bounded deterministic price evolution for stale snapshots.
//!
//! Time is partitioned into 10-second buckets; a stable hash of
//! `(symbol, bucket)` yields a unit value in [-1, 1], so the same
//! symbol and bucket always produce the same price. The reachable
//! delta grows with snapshot staleness (0.25 % per minute, capped at
//! 0.75 %), ramps in over the first two minutes, and is clamped to an
//! absolute cap that shrinks as the price tier grows.

pub mod baseline;

use chrono::{DateTime, Utc};

use crate::models::{round_dp, Quote, QuoteSource, Snapshot};

/// Bucket width for the deterministic noise.
const BUCKET_MS: i64 = 10_000;

/// Reachable delta grows by this fraction per minute of staleness.
const MAX_PERCENT_PER_MINUTE: f64 = 0.0025;

/// Staleness bound cap.
const MAX_PERCENT_CAP: f64 = 0.0075;

/// Minutes over which the effect ramps in after the cache goes stale.
const SMOOTHING_RAMP_MINUTES: f64 = 2.0;

/// Evolve a snapshot's quotes to `now`.
///
/// Pure given `now`: two calls with the same snapshot and the same
/// 10-second bucket yield identical output. Every output price is
/// finite and within [`max_abs_delta`] of its input.
pub fn simulate(snapshot: &Snapshot, volatility: f64, now: DateTime<Utc>) -> Vec<Quote> {
    let elapsed_ms = (now - snapshot.captured_at).num_milliseconds().max(0);
    let elapsed_minutes = elapsed_ms as f64 / 60_000.0;
    let max_percent = (elapsed_minutes * MAX_PERCENT_PER_MINUTE).min(MAX_PERCENT_CAP);
    let smoothing = (elapsed_minutes / SMOOTHING_RAMP_MINUTES).min(1.0);
    let bucket = now.timestamp_millis() / BUCKET_MS;

    snapshot
        .quotes
        .iter()
        .map(|quote| {
            let unit = unit_noise(&quote.symbol, bucket);
            let raw = quote.price * unit * max_percent * volatility;
            let cap = max_abs_delta(quote.price);
            let delta = raw.clamp(-cap, cap) * smoothing;
            let price = round_dp(quote.price + delta, 6);

            let mut evolved = quote.clone();
            evolved.price = price;
            evolved.high = Some(quote.high.unwrap_or(quote.price).max(price));
            evolved.low = Some(quote.low.unwrap_or(quote.price).min(price));
            evolved.set_change_from(quote.previous_close.unwrap_or(quote.price));
            evolved.source = QuoteSource::Simulated;
            evolved
        })
        .collect()
}

/// Deterministic unit value in [-1, 1] for `(symbol, bucket)`.
pub fn unit_noise(symbol: &str, bucket: i64) -> f64 {
    let digest = md5::compute(format!("{}:{}", symbol, bucket));
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let raw = u64::from_be_bytes(bytes);
    (raw as f64 / u64::MAX as f64) * 2.0 - 1.0
}

/// Absolute delta cap for a price. Higher-priced assets move less in
/// relative terms.
pub fn max_abs_delta(price: f64) -> f64 {
    let p = price.abs();
    let cap_fraction = if p >= 50_000.0 {
        0.0002
    } else if p >= 10_000.0 {
        0.0004
    } else if p >= 1_000.0 {
        0.0008
    } else if p >= 100.0 {
        0.0015
    } else {
        0.003
    };
    p * cap_fraction
}
