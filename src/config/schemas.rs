/// Configuration schemas, each declared once with its defaults
use crate::config_struct;

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// HTTP / WebSocket listener
    pub struct ServerConfig {
        /// Bind address (127.0.0.1 = local only, 0.0.0.0 = all interfaces)
        host: String = "127.0.0.1".to_string(),
        port: u16 = 3000,
        /// Path of the WebSocket upgrade endpoint
        ws_path: String = "/ws".to_string(),
        /// Allow any origin (overrides `cors_allowed_origins`)
        cors_allow_all: bool = false,
        cors_allowed_origins: Vec<String> = Vec::new(),
    }
}

// ============================================================================
// HUB CONFIGURATION
// ============================================================================

config_struct! {
    /// Live state hub and per-connection supervision
    pub struct HubConfig {
        /// Outbound queue size per client; a full queue evicts the client
        client_queue_capacity: usize = 256,
        /// Pending broadcast events buffered ahead of the dispatch loop
        broadcast_queue_capacity: usize = 256,
        /// Silence window after which a connection is considered dead
        read_timeout_secs: u64 = 60,
        /// Deadline for a single outbound frame
        write_timeout_secs: u64 = 10,
        /// Inbound frames larger than this terminate the connection
        max_message_bytes: usize = 2 * 1024 * 1024,
    }
}

// ============================================================================
// LOGGING CONFIGURATION
// ============================================================================

config_struct! {
    pub struct LoggingConfig {
        file_enabled: bool = true,
        /// error | warning | info | debug | verbose
        min_level: String = "info".to_string(),
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    /// Root configuration (one TOML table per section)
    pub struct Config {
        server: ServerConfig = ServerConfig::default(),
        hub: HubConfig = HubConfig::default(),
        logging: LoggingConfig = LoggingConfig::default(),
    }
}
