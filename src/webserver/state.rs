/// Shared application state for the webserver
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::live::{Hub, SessionSettings};

/// State passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    /// Handle to the running hub
    pub hub: Hub,

    /// Per-connection supervision applied to every upgraded socket
    pub session: SessionSettings,

    /// Listener configuration
    pub server: Arc<ServerConfig>,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(hub: Hub, session: SessionSettings, server: ServerConfig) -> Self {
        Self {
            hub,
            session,
            server: Arc::new(server),
            startup_time: chrono::Utc::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time)
            .num_seconds()
            .max(0) as u64
    }
}
