use axum::{routing::get, Router};
use std::sync::Arc;

use crate::webserver::state::AppState;

pub mod status;
pub mod ws;

pub fn create_router(state: Arc<AppState>) -> Router {
    let ws_path = normalize_path(&state.server.ws_path);

    Router::new()
        .route(&ws_path, get(ws::ws_handler))
        .route("/health", get(status::health_check))
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new().merge(status::routes())
}

/// Routes must start with '/'
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        "/ws".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/ws"), "/ws");
        assert_eq!(normalize_path("live"), "/live");
        assert_eq!(normalize_path("  "), "/ws");
    }
}
