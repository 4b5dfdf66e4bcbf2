use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, footprint policy and live grid count.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let grids = state.grids.read().await.len();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "masonry-api",
        "sizePolicy": state.engine.policy_name(),
        "grids": grids
    }))
}
