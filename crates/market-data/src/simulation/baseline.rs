//! Synthetic baseline quotes, used only when no snapshot exists.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::models::{round_dp, MarketCatalog, Quote, QuoteSource};

/// Bounded variation applied around the configured baseline price.
const BASELINE_VARIATION: f64 = 0.012;

/// Generate a mock quote set for a market from its configured
/// baseline prices.
pub fn generate(catalog: &MarketCatalog, market: &str, now: DateTime<Utc>) -> Vec<Quote> {
    let mut rng = rand::thread_rng();
    let trading_day = now.format("%Y-%m-%d").to_string();

    catalog
        .symbols(market)
        .iter()
        .map(|symbol| {
            let base = catalog.baseline_price(market, symbol);
            let variation = rng.gen_range(-BASELINE_VARIATION..=BASELINE_VARIATION);
            let price = round_dp(base * (1.0 + variation), 6);

            let mut quote = Quote::new(
                symbol.clone(),
                price,
                market.to_string(),
                QuoteSource::Mock,
            );
            quote.previous_close = Some(base);
            quote.latest_trading_day = Some(trading_day.clone());
            quote.set_change_from(base);
            quote
        })
        .collect()
}
