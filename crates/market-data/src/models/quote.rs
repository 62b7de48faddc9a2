use serde::{Deserialize, Serialize};

/// Provenance of a quote.
///
/// Load-bearing for consumers: the orchestrator never surfaces
/// upstream failure, so this field is the only way a caller can
/// distinguish genuine real-time data from simulated or mock data.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// Fetched from the upstream provider
    Real,
    /// Evolved from a stale cached quote
    Simulated,
    /// Generated from configured baseline prices
    Mock,
}

/// One symbol's market data snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Ticker symbol
    pub symbol: String,

    /// Current price. Always finite.
    pub price: f64,

    /// Session high (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,

    /// Session low (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,

    /// Previous session close (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,

    /// Absolute change against previous close (derived)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,

    /// Percentage change against previous close (derived)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,

    /// Latest trading day as reported by the provider (YYYY-MM-DD)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_trading_day: Option<String>,

    /// Owning market key (e.g. "crypto")
    pub market: String,

    /// Provenance of this quote
    pub source: QuoteSource,
}

impl Quote {
    /// Create a quote with the minimal required fields.
    pub fn new(symbol: String, price: f64, market: String, source: QuoteSource) -> Self {
        Self {
            symbol,
            price,
            high: None,
            low: None,
            previous_close: None,
            change: None,
            change_percent: None,
            latest_trading_day: None,
            market,
            source,
        }
    }

    /// Recompute `change` and `change_percent` against a reference
    /// price (normally the previous close).
    pub fn set_change_from(&mut self, reference: f64) {
        let change = round_dp(self.price - reference, 6);
        self.change = Some(change);
        self.change_percent = if reference != 0.0 {
            Some(round_dp(change / reference * 100.0, 4))
        } else {
            None
        };
    }
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_dp(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_new() {
        let quote = Quote::new(
            "BTC".to_string(),
            68000.0,
            "crypto".to_string(),
            QuoteSource::Real,
        );
        assert_eq!(quote.price, 68000.0);
        assert!(quote.high.is_none());
        assert_eq!(quote.source, QuoteSource::Real);
    }

    #[test]
    fn test_set_change_from() {
        let mut quote = Quote::new(
            "AAPL".to_string(),
            101.0,
            "stocks".to_string(),
            QuoteSource::Real,
        );
        quote.set_change_from(100.0);
        assert_eq!(quote.change, Some(1.0));
        assert_eq!(quote.change_percent, Some(1.0));
    }

    #[test]
    fn test_set_change_from_zero_reference() {
        let mut quote = Quote::new(
            "X".to_string(),
            5.0,
            "stocks".to_string(),
            QuoteSource::Mock,
        );
        quote.set_change_from(0.0);
        assert_eq!(quote.change, Some(5.0));
        assert!(quote.change_percent.is_none());
    }

    #[test]
    fn test_source_serialization() {
        assert_eq!(
            serde_json::to_string(&QuoteSource::Real).unwrap(),
            "\"real\""
        );
        assert_eq!(
            serde_json::to_string(&QuoteSource::Simulated).unwrap(),
            "\"simulated\""
        );
        assert_eq!(
            serde_json::to_string(&QuoteSource::Mock).unwrap(),
            "\"mock\""
        );
    }

    #[test]
    fn test_camel_case_wire_names() {
        let mut quote = Quote::new(
            "ETH".to_string(),
            3500.5,
            "crypto".to_string(),
            QuoteSource::Simulated,
        );
        quote.previous_close = Some(3400.0);
        quote.set_change_from(3400.0);
        let json = serde_json::to_value(&quote).unwrap();
        assert!(json.get("previousClose").is_some());
        assert!(json.get("changePercent").is_some());
        assert!(json.get("previous_close").is_none());
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(1.2345678, 6), 1.234568);
        assert_eq!(round_dp(100.0, 6), 100.0);
        assert_eq!(round_dp(-0.0000015, 6), -0.000002);
    }
}
