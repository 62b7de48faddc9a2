//! Alpha Vantage quote provider implementation.
//!
//! Fetches latest quotes via the GLOBAL_QUOTE endpoint. The free tier
//! is heavily rate limited, and quota exhaustion is reported inside an
//! otherwise-200 response body ("Note"/"Information" fields), so the
//! rate-limit signal must be detected from response content rather
//! than status codes alone.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::QuoteError;
use crate::guard::RateGuard;
use crate::models::{Quote, QuoteSource};
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Cooldown armed when the provider signals quota exhaustion.
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// Per-call transport timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Alpha Vantage quote provider.
///
/// Owns the process-wide [`RateGuard`]: a rate-limit signal blocks
/// every subsequent call, for any symbol, until the cooldown elapses.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    guard: Arc<RateGuard>,
}

// ============================================================================
// Response structures for the Alpha Vantage API
// ============================================================================

/// GLOBAL_QUOTE response envelope
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuotePayload>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuotePayload {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

// ============================================================================
// AlphaVantageProvider implementation
// ============================================================================

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider with the given API key.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            guard: Arc::new(RateGuard::new()),
        }
    }

    /// The cooldown gate armed by this provider.
    pub fn guard(&self) -> &RateGuard {
        &self.guard
    }

    /// Make a request to the Alpha Vantage API.
    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, QuoteError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &self.api_key));

        let url = reqwest::Url::parse_with_params(BASE_URL, &all_params)
            .map_err(|e| QuoteError::UpstreamFailed(format!("Failed to build URL: {}", e)))?;

        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(&self.api_key, "***")
        );

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.guard.block(RATE_LIMIT_COOLDOWN);
            return Err(QuoteError::RateLimited);
        }

        if !status.is_success() {
            return Err(QuoteError::UpstreamFailed(format!("HTTP {}", status)));
        }

        Ok(response.text().await?)
    }

    /// Check for API-level errors embedded in the response body,
    /// arming the rate guard on a quota note.
    fn classify_body(
        &self,
        error_message: &Option<String>,
        note: &Option<String>,
        information: &Option<String>,
    ) -> Result<(), QuoteError> {
        if let Some(msg) = error_message {
            return Err(QuoteError::UpstreamFailed(msg.clone()));
        }

        // "Note" usually indicates rate limiting
        if let Some(msg) = note {
            if is_rate_limit_text(msg) {
                self.guard.block(RATE_LIMIT_COOLDOWN);
                return Err(QuoteError::RateLimited);
            }
            warn!("Alpha Vantage note: {}", msg);
        }

        // "Information" can indicate various issues, including the
        // free-tier daily quota
        if let Some(msg) = information {
            if is_rate_limit_text(msg) {
                self.guard.block(RATE_LIMIT_COOLDOWN);
                return Err(QuoteError::RateLimited);
            }
            warn!("Alpha Vantage info: {}", msg);
        }

        Ok(())
    }

    /// Parse the required price field; rejects non-finite values.
    fn parse_price(symbol: &str, value: &str) -> Result<f64, QuoteError> {
        match value.trim().parse::<f64>() {
            Ok(price) if price.is_finite() => Ok(price),
            _ => Err(QuoteError::InvalidPrice {
                symbol: symbol.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Parse an optional numeric field, dropping non-finite values.
    fn parse_optional(value: &Option<String>) -> Option<f64> {
        value
            .as_ref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Parse a percentage field like "1.1828%".
    fn parse_percent(value: &Option<String>) -> Option<f64> {
        value
            .as_ref()
            .and_then(|s| s.trim().trim_end_matches('%').parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

// ============================================================================
// QuoteProvider trait implementation
// ============================================================================

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, market: &str, symbol: &str) -> Result<Quote, QuoteError> {
        if !self.guard.available() {
            return Err(QuoteError::RateLimited);
        }

        let params = [("function", "GLOBAL_QUOTE"), ("symbol", symbol)];
        let text = self.fetch(&params).await?;

        let response: GlobalQuoteResponse = serde_json::from_str(&text)
            .map_err(|e| QuoteError::UpstreamFailed(format!("Failed to parse response: {}", e)))?;

        self.classify_body(
            &response.error_message,
            &response.note,
            &response.information,
        )?;

        let payload = response.global_quote.ok_or_else(|| {
            QuoteError::UpstreamFailed(format!("No quote payload for symbol: {}", symbol))
        })?;

        let price_text = payload.price.as_deref().ok_or_else(|| {
            QuoteError::UpstreamFailed(format!("Empty quote payload for symbol: {}", symbol))
        })?;
        let price = Self::parse_price(symbol, price_text)?;

        let mut quote = Quote::new(
            payload.symbol.unwrap_or_else(|| symbol.to_string()),
            price,
            market.to_string(),
            QuoteSource::Real,
        );
        quote.high = Self::parse_optional(&payload.high);
        quote.low = Self::parse_optional(&payload.low);
        quote.previous_close = Self::parse_optional(&payload.previous_close);
        quote.change = Self::parse_optional(&payload.change);
        quote.change_percent = Self::parse_percent(&payload.change_percent);
        quote.latest_trading_day = payload.latest_trading_day;

        if quote.change.is_none() {
            if let Some(previous_close) = quote.previous_close {
                quote.set_change_from(previous_close);
            }
        }

        debug!("Alpha Vantage: fetched quote for {} at {}", symbol, price);

        Ok(quote)
    }
}

fn is_rate_limit_text(message: &str) -> bool {
    message.contains("API call frequency") || message.contains("rate limit")
}
