//! Transport seam between the hub and an already-upgraded connection
//!
//! The hub never sees a socket. A connection is handed over as a
//! `FrameSink` (outbound direction, driven by the keepalive writer) and a
//! `FrameSource` (inbound direction, driven by the connection's read loop).
//! Deadlines are applied by the callers with `tokio::time::timeout`, so
//! implementations only need to move frames.
//!
//! Implementations:
//! - `webserver::routes::ws` wraps an axum `WebSocket`
//! - `memory` is an in-process pair used by tests and embedders

pub mod memory;

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::live::Payload;

/// Inbound frame kinds the hub cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Application message (text or binary), opaque to the hub
    Payload(Payload),
    /// Peer liveness probe
    Ping,
    /// Acknowledgement of one of our probes
    Pong,
    /// Peer initiated close
    Close,
}

/// Outbound direction of one connection
#[async_trait]
pub trait FrameSink: Send + 'static {
    /// Write one application message
    async fn send_payload(&mut self, payload: Payload) -> Result<(), TransportError>;

    /// Write a liveness probe
    async fn send_ping(&mut self) -> Result<(), TransportError>;

    /// Write a close notification and shut the direction down
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Inbound direction of one connection
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Next frame; `None` once the connection is gone
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>>;
}
