use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::state::AppState;

/// Liveness probe reporting the active snapshot store backend.
async fn get_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let store = state
        .orchestrator
        .as_ref()
        .map(|o| o.store_backend())
        .unwrap_or("none");

    Json(serde_json::json!({
        "status": "ok",
        "store": store,
        "quotesEnabled": state.orchestrator.is_some(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}
