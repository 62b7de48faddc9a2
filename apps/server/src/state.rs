use std::sync::Arc;

use marketpulse_market_data::{
    AlphaVantageProvider, MarketCatalog, MemorySnapshotStore, OrchestratorConfig,
    QuoteOrchestrator, RedisSnapshotStore, SnapshotStore, SNAPSHOT_TTL,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// None when the provider API key is absent; the quote endpoint
    /// then answers 500.
    pub orchestrator: Option<Arc<QuoteOrchestrator>>,

    /// The configured market table, served by `/api/markets`.
    pub catalog: MarketCatalog,
}

pub fn init_tracing() {
    let log_format = std::env::var("MARKETPULSE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let catalog = MarketCatalog::builtin();

    let orchestrator = match &config.api_key {
        Some(api_key) => {
            let store: Arc<dyn SnapshotStore> = match &config.redis_url {
                Some(url) => Arc::new(RedisSnapshotStore::connect(url, SNAPSHOT_TTL)?),
                None => Arc::new(MemorySnapshotStore::new(SNAPSHOT_TTL)),
            };
            tracing::info!("Snapshot store backend: {}", store.backend());

            let provider = Arc::new(AlphaVantageProvider::new(api_key.clone()));
            let orchestrator_config = OrchestratorConfig {
                requests_per_minute: config.requests_per_minute,
                ..Default::default()
            };
            Some(Arc::new(QuoteOrchestrator::new(
                provider,
                store,
                catalog.clone(),
                orchestrator_config,
            )))
        }
        None => {
            tracing::warn!("MARKETPULSE_API_KEY is not set; quote requests will answer 500");
            None
        }
    };

    Ok(Arc::new(AppState {
        orchestrator,
        catalog,
    }))
}
