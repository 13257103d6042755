/// Error types for livesync
///
/// None of these reach end users: transport errors end one connection,
/// hub errors mean the dispatch actor is gone, config errors abort startup.
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// TRANSPORT ERRORS
// =============================================================================

/// Failure on one physical connection. Always terminal for that connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("connection closed")]
    Closed,

    #[error("{operation} deadline of {}ms exceeded", deadline.as_millis())]
    Timeout {
        operation: &'static str,
        deadline: Duration,
    },

    #[error("inbound message of {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge { size: usize, limit: usize },
}

// =============================================================================
// HUB ERRORS
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    /// The dispatch actor has exited; no further events can be delivered
    #[error("hub dispatch loop is not running")]
    Stopped,
}

// =============================================================================
// CONFIGURATION ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("config already initialized")]
    AlreadyInitialized,

    #[error("config not initialized, call load_config() first")]
    NotInitialized,

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TransportError::Timeout {
            operation: "write",
            deadline: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "write deadline of 10000ms exceeded");

        let err = TransportError::MessageTooLarge {
            size: 3_000_000,
            limit: 2_097_152,
        };
        assert!(err.to_string().contains("2097152"));

        assert_eq!(HubError::Stopped.to_string(), "hub dispatch loop is not running");
    }
}
