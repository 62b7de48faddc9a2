//! Error types for the market data crate.
//!
//! Every upstream-fetch-path error is caught at the orchestrator's
//! fetch boundary and converted into a fallback quote set; none of
//! these variants reach an HTTP caller.

use thiserror::Error;

/// Errors that can occur while fetching or caching quotes.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// The provider signaled quota exhaustion, either via HTTP 429 or
    /// a rate-limit note embedded in a 200 response body. Arms the
    /// process-wide cooldown gate.
    #[error("Rate limited by provider")]
    RateLimited,

    /// Transport failure, undecodable response, or a provider-reported
    /// error field.
    #[error("Upstream fetch failed: {0}")]
    UpstreamFailed(String),

    /// The provider returned a price that does not parse to a finite
    /// number.
    #[error("Invalid price for {symbol}: {value:?}")]
    InvalidPrice {
        /// Symbol the bad price was returned for
        symbol: String,
        /// Raw price text as received
        value: String,
    },

    /// The durable cache store is unreachable. Consumed inside the
    /// store layer, which degrades to the in-process fallback.
    #[error("Cache store unavailable: {0}")]
    CacheUnavailable(String),
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        QuoteError::UpstreamFailed(err.to_string())
    }
}

impl From<redis::RedisError> for QuoteError {
    fn from(err: redis::RedisError) -> Self {
        QuoteError::CacheUnavailable(err.to_string())
    }
}
