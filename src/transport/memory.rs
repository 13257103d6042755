//! In-process transport
//!
//! `memory_transport` returns the hub-facing halves plus a `MemoryPeer`
//! that plays the remote client. The outbound buffer is bounded, so a peer
//! that stops reading makes writes stall exactly like a congested socket.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{FrameSink, FrameSource, InboundFrame};
use crate::errors::TransportError;
use crate::live::Payload;

/// Frames as observed by the peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Payload(Payload),
    Ping,
    Close,
}

impl OutboundFrame {
    /// Payload bytes as text, if this is a UTF-8 payload frame
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutboundFrame::Payload(payload) => std::str::from_utf8(payload).ok(),
            _ => None,
        }
    }
}

pub struct MemorySink {
    tx: mpsc::Sender<OutboundFrame>,
}

pub struct MemorySource {
    rx: mpsc::Receiver<Result<InboundFrame, TransportError>>,
}

/// Remote end of an in-process connection
pub struct MemoryPeer {
    inbound: mpsc::Sender<Result<InboundFrame, TransportError>>,
    outbound: mpsc::Receiver<OutboundFrame>,
}

/// Create a connected sink/source pair
///
/// `outbound_buffer` bounds how many frames can be written before the peer
/// reads; further writes wait.
pub fn memory_transport(outbound_buffer: usize) -> (MemorySink, MemorySource, MemoryPeer) {
    let (out_tx, out_rx) = mpsc::channel(outbound_buffer.max(1));
    let (in_tx, in_rx) = mpsc::channel(64);
    (
        MemorySink { tx: out_tx },
        MemorySource { rx: in_rx },
        MemoryPeer {
            inbound: in_tx,
            outbound: out_rx,
        },
    )
}

impl MemorySink {
    async fn push(&mut self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.tx.send(frame).await.map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_payload(&mut self, payload: Payload) -> Result<(), TransportError> {
        self.push(OutboundFrame::Payload(payload)).await
    }

    async fn send_ping(&mut self) -> Result<(), TransportError> {
        self.push(OutboundFrame::Ping).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.push(OutboundFrame::Close).await
    }
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>> {
        self.rx.recv().await
    }
}

impl MemoryPeer {
    async fn push(&self, frame: Result<InboundFrame, TransportError>) -> Result<(), TransportError> {
        self.inbound.send(frame).await.map_err(|_| TransportError::Closed)
    }

    /// Send a text message to the hub
    pub async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.push(Ok(InboundFrame::Payload(Payload::from(text.as_bytes()))))
            .await
    }

    /// Send raw bytes to the hub
    pub async fn send_bytes(&self, bytes: &[u8]) -> Result<(), TransportError> {
        self.push(Ok(InboundFrame::Payload(Payload::from(bytes)))).await
    }

    /// Acknowledge a probe
    pub async fn send_pong(&self) -> Result<(), TransportError> {
        self.push(Ok(InboundFrame::Pong)).await
    }

    /// Send a close notification
    pub async fn send_close(&self) -> Result<(), TransportError> {
        self.push(Ok(InboundFrame::Close)).await
    }

    /// Make the hub's next read fail
    pub async fn fail_read(&self, reason: &str) -> Result<(), TransportError> {
        self.push(Err(TransportError::Receive(reason.to_string())))
            .await
    }

    /// Next frame written by the hub; `None` once the sink is dropped
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        self.outbound.recv().await
    }

    /// Next payload frame, skipping probes
    pub async fn recv_payload(&mut self) -> Option<OutboundFrame> {
        loop {
            match self.outbound.recv().await? {
                OutboundFrame::Ping => continue,
                frame => return Some(frame),
            }
        }
    }

    /// Frame already written, without waiting
    pub fn try_recv(&mut self) -> Option<OutboundFrame> {
        self.outbound.try_recv().ok()
    }
}
