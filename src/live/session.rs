/// One connection, end to end
///
/// `serve_connection` registers the client, hands the outbound half to a
/// keepalive writer, and runs the read loop on the calling task. Every
/// inbound payload is classified, cached when tagged, and broadcast as-is.
/// Whichever direction ends first, the connection converges on the same
/// unregistration.
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;

use crate::arguments::is_debug_connection_enabled;
use crate::config::HubConfig;
use crate::errors::{HubError, TransportError};
use crate::logger::{self, LogTag};
use crate::transport::{FrameSink, FrameSource, InboundFrame};

use super::client::ClientId;
use super::health::{run_keepalive, KeepaliveConfig, WriterExit};
use super::hub::Hub;
use super::message::classify;
use super::metrics::{ConnectionMetrics, ConnectionMetricsSnapshot};

// ============================================================================
// SETTINGS / OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub keepalive: KeepaliveConfig,
    /// Inbound payloads above this size end the connection
    pub max_message_bytes: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            keepalive: KeepaliveConfig::default(),
            max_message_bytes: 2 * 1024 * 1024,
        }
    }
}

impl From<&HubConfig> for SessionSettings {
    fn from(config: &HubConfig) -> Self {
        Self {
            keepalive: KeepaliveConfig::from(config),
            max_message_bytes: config.max_message_bytes,
        }
    }
}

/// Why the read loop ended
#[derive(Debug)]
pub enum CloseReason {
    PeerClosed,
    ReadTimeout(Duration),
    /// Includes inbound messages over the size limit
    ReadFailed(TransportError),
    WriterStopped,
    HubStopped,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::PeerClosed => write!(f, "peer closed"),
            CloseReason::ReadTimeout(window) => {
                write!(f, "no inbound frame for {}s", window.as_secs())
            }
            CloseReason::ReadFailed(e) => write!(f, "read failed: {}", e),
            CloseReason::WriterStopped => write!(f, "writer stopped"),
            CloseReason::HubStopped => write!(f, "hub stopped"),
        }
    }
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub client_id: ClientId,
    pub reason: CloseReason,
    pub writer: WriterExit,
    pub metrics: ConnectionMetricsSnapshot,
}

// ============================================================================
// SESSION
// ============================================================================

/// Serve one already-upgraded connection until it ends
///
/// Fails only when the hub is not running, in which case the sink is
/// closed and nothing is registered.
pub async fn serve_connection<S, R>(
    hub: &Hub,
    mut sink: S,
    mut source: R,
    settings: SessionSettings,
) -> Result<SessionOutcome, HubError>
where
    S: FrameSink,
    R: FrameSource,
{
    let handle = match hub.register().await {
        Ok(handle) => handle,
        Err(e) => {
            let _ = sink.close().await;
            return Err(e);
        }
    };
    let client_id = handle.id;
    let metrics = ConnectionMetrics::new();

    logger::info(
        LogTag::Connection,
        &format!("Client {} connected (active={})", client_id, hub.client_count()),
    );

    let mut writer = tokio::spawn(run_keepalive(
        sink,
        handle.outbound,
        settings.keepalive,
        client_id,
        metrics.clone(),
    ));
    let mut writer_exit = None;

    let read_timeout = settings.keepalive.read_timeout;
    let reason = loop {
        tokio::select! {
            biased;

            exit = &mut writer => {
                writer_exit = Some(exit.unwrap_or(WriterExit::Aborted));
                break CloseReason::WriterStopped;
            }

            frame = timeout(read_timeout, source.next_frame()) => match frame {
                Err(_) => break CloseReason::ReadTimeout(read_timeout),
                Ok(None) | Ok(Some(Ok(InboundFrame::Close))) => break CloseReason::PeerClosed,
                Ok(Some(Err(e))) => break CloseReason::ReadFailed(e),
                // Liveness only; the next iteration starts a fresh read window
                Ok(Some(Ok(InboundFrame::Ping))) | Ok(Some(Ok(InboundFrame::Pong))) => {}
                Ok(Some(Ok(InboundFrame::Payload(payload)))) => {
                    if payload.len() > settings.max_message_bytes {
                        break CloseReason::ReadFailed(TransportError::MessageTooLarge {
                            size: payload.len(),
                            limit: settings.max_message_bytes,
                        });
                    }
                    metrics.inc_received();

                    if let Some(category) = classify(&payload) {
                        hub.set_last(category, payload.clone());
                        metrics.inc_cached();
                        if is_debug_connection_enabled() {
                            logger::debug(
                                LogTag::Connection,
                                &format!("Client {} published {}", client_id, category),
                            );
                        }
                    }

                    if hub.broadcast(payload).await.is_err() {
                        break CloseReason::HubStopped;
                    }
                }
            }
        }
    };

    // Releases the queue; a live writer flushes what is left and closes
    if hub.unregister(client_id).await.is_err() {
        logger::debug(
            LogTag::Connection,
            &format!("Client {}: hub gone during unregister", client_id),
        );
    }

    let writer_exit = match writer_exit {
        Some(exit) => exit,
        None => match timeout(settings.keepalive.write_timeout, &mut writer).await {
            Ok(exit) => exit.unwrap_or(WriterExit::Aborted),
            Err(_) => {
                writer.abort();
                WriterExit::Aborted
            }
        },
    };

    let outcome = SessionOutcome {
        client_id,
        reason,
        writer: writer_exit,
        metrics: metrics.snapshot(),
    };

    logger::info(
        LogTag::Connection,
        &format!("Client {} disconnected: {}", client_id, outcome.reason),
    );
    if is_debug_connection_enabled() {
        logger::debug(
            LogTag::Connection,
            &format!(
                "Client {} stats: sent={} probes={} received={} cached={} writer={:?}",
                client_id,
                outcome.metrics.frames_sent,
                outcome.metrics.probes_sent,
                outcome.metrics.payloads_received,
                outcome.metrics.payloads_cached,
                outcome.writer
            ),
        );
    }

    Ok(outcome)
}
