//! Data model for the market data crate.

mod market;
mod quote;
mod snapshot;

pub use market::{
    MarketCatalog, MarketSpec, DEFAULT_BASELINE_PRICE, DEFAULT_MARKET, DEFAULT_VOLATILITY,
};
pub use quote::{Quote, QuoteSource};
pub use snapshot::Snapshot;

pub(crate) use quote::round_dp;
