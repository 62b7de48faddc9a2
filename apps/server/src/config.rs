//! Environment-provided server configuration.

use marketpulse_market_data::DEFAULT_REQUESTS_PER_MINUTE;

/// Server configuration, read once at startup.
pub struct Config {
    /// Address the HTTP listener binds to.
    pub listen_addr: String,

    /// Upstream provider API key. Absence does not prevent startup
    /// but makes the quote endpoint answer 500.
    pub api_key: Option<String>,

    /// Upstream requests-per-minute budget.
    pub requests_per_minute: u32,

    /// Durable snapshot store coordinates. Absence selects the
    /// in-process store.
    pub redis_url: Option<String>,
}

impl Config {
    /// Read configuration from the environment (and `.env` if present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let listen_addr = std::env::var("MARKETPULSE_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let api_key = std::env::var("MARKETPULSE_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let requests_per_minute = std::env::var("MARKETPULSE_RPM")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE);
        let redis_url = std::env::var("MARKETPULSE_REDIS_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Self {
            listen_addr,
            api_key,
            requests_per_minute,
            redis_url,
        }
    }
}
