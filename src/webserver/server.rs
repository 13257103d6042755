/// Axum webserver lifecycle: bind, serve, graceful shutdown
use axum::{http::HeaderValue, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{
    config::ServerConfig,
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Global shutdown notifier
static SHUTDOWN_NOTIFY: once_cell::sync::Lazy<Arc<Notify>> =
    once_cell::sync::Lazy::new(|| Arc::new(Notify::new()));

/// Bind the configured address and serve until `shutdown()` is called
pub async fn start_server(state: Arc<AppState>) -> Result<(), String> {
    let addr: SocketAddr = format!("{}:{}", state.server.host, state.server.port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => format!(
            "Failed to bind to {}: Address already in use\n\
             \n\
             Another livesync instance (or another service) is using port {}.\n\
             Pick a different port with --port or the PORT environment variable.",
            addr, state.server.port
        ),
        std::io::ErrorKind::PermissionDenied => format!(
            "Failed to bind to {}: Permission denied\n\
             \n\
             Port {} requires elevated privileges on this system.\n\
             Consider using a port above 1024.",
            addr, state.server.port
        ),
        _ => format!("Failed to bind to {}: {}", addr, e),
    })?;

    logger::info(
        LogTag::Webserver,
        &format!(
            "Listening on http://{} (websocket at {})",
            addr, state.server.ws_path
        ),
    );

    serve(listener, state).await
}

/// Serve on an already bound listener until `shutdown()` is called
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), String> {
    let app = build_app(state);

    let shutdown_signal = async {
        SHUTDOWN_NOTIFY.notified().await;
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");
    Ok(())
}

/// Trigger webserver shutdown
pub fn shutdown() {
    logger::debug(LogTag::Webserver, "Triggering webserver shutdown...");
    // notify_one stores a permit, so a shutdown before serve starts is not lost
    SHUTDOWN_NOTIFY.notify_one();
}

/// Build the router with all routes and middleware
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.server);
    let app = routes::create_router(state);

    match cors {
        Some(layer) => app.layer(layer),
        None => app,
    }
}

/// CORS policy: everything, an explicit origin list, or none at all
fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    if config.cors_allow_all {
        return Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                logger::warning(
                    LogTag::Webserver,
                    &format!("Ignoring invalid CORS origin '{}'", origin),
                );
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_selection() {
        let none = ServerConfig::default();
        assert!(cors_layer(&none).is_none());

        let all = ServerConfig {
            cors_allow_all: true,
            ..ServerConfig::default()
        };
        assert!(cors_layer(&all).is_some());

        let listed = ServerConfig {
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            ..ServerConfig::default()
        };
        assert!(cors_layer(&listed).is_some());

        let invalid_only = ServerConfig {
            cors_allowed_origins: vec!["bad\norigin".to_string()],
            ..ServerConfig::default()
        };
        assert!(cors_layer(&invalid_only).is_none());
    }
}
