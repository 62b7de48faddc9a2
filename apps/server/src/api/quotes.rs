use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use marketpulse_market_data::{Quote, DEFAULT_MARKET};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(serde::Deserialize)]
struct QuotesQuery {
    market: Option<String>,
}

/// Get the quote set for a market. Always 200 with a quote sequence
/// once the service is configured; provenance is carried in each
/// quote's `source` field.
async fn get_quotes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuotesQuery>,
) -> ApiResult<Json<Vec<Quote>>> {
    let orchestrator = state
        .orchestrator
        .as_ref()
        .ok_or_else(ApiError::missing_credentials)?;
    let market = query.market.as_deref().unwrap_or(DEFAULT_MARKET);
    Ok(Json(orchestrator.get_quotes(market).await))
}

/// List configured markets and their symbols.
async fn list_markets(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let markets: serde_json::Map<String, serde_json::Value> = state
        .catalog
        .market_names()
        .iter()
        .map(|name| {
            (
                (*name).to_string(),
                serde_json::json!(state.catalog.symbols(name)),
            )
        })
        .collect();
    Json(serde_json::Value::Object(markets))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotes", get(get_quotes))
        .route("/markets", get(list_markets))
}
