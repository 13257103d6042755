use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    arguments::is_debug_webserver_enabled,
    live::HubMetricsSnapshot,
    logger::{self, LogTag},
    webserver::state::AppState,
};

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub clients: usize,
    pub uptime_secs: u64,
    pub metrics: HubMetricsSnapshot,
}

/// Which categories currently hold a cached payload
#[derive(Debug, Clone, Serialize)]
pub struct LiveSnapshotResponse {
    pub slots: BTreeMap<&'static str, bool>,
    pub clients: usize,
}

/// Create status routes (mounted under /api)
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/live/snapshot", get(live_snapshot))
}

/// GET /health and /api/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    if is_debug_webserver_enabled() {
        logger::debug(LogTag::Webserver, "Health check endpoint called");
    }

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        clients: state.hub.client_count(),
        uptime_secs: state.uptime_seconds(),
        metrics: state.hub.metrics(),
    };

    Json(response).into_response()
}

/// GET /api/live/snapshot
async fn live_snapshot(State(state): State<Arc<AppState>>) -> Response {
    let slots = state
        .hub
        .snapshot()
        .populated()
        .into_iter()
        .map(|(category, populated)| (category.slot_name(), populated))
        .collect();

    Json(LiveSnapshotResponse {
        slots,
        clients: state.hub.client_count(),
    })
    .into_response()
}
