//! Upstream quote provider trait definition.

use async_trait::async_trait;

use crate::errors::QuoteError;
use crate::models::Quote;

/// Trait for the upstream quote source.
///
/// The orchestrator fetches through this seam so tests can script
/// upstream behavior without a network.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for one symbol. One network call.
    ///
    /// `market` is the owning market key and is carried into the
    /// returned quote; the upstream call itself is symbol-only.
    async fn fetch_quote(&self, market: &str, symbol: &str) -> Result<Quote, QuoteError>;
}
