/// Keepalive supervision for one connection
///
/// The writer task owns the outbound half of a connection. It drains the
/// client's queue, probes the peer on a fixed period, and applies a write
/// deadline to every frame. Any write failure ends it; the read side notices
/// and unregisters the client.
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use crate::config::HubConfig;
use crate::errors::TransportError;
use crate::logger::{self, LogTag};
use crate::transport::FrameSink;

use super::client::ClientId;
use super::metrics::ConnectionMetrics;
use super::Payload;

// ============================================================================
// KEEPALIVE CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveConfig {
    /// Inbound silence after which the connection is dead
    pub read_timeout: Duration,

    /// Deadline for each outbound frame (payload, probe or close)
    pub write_timeout: Duration,

    /// Probe interval, shorter than `read_timeout` so a healthy peer's
    /// pong always lands inside the read window
    pub ping_period: Duration,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self::from_timeouts(Duration::from_secs(60), Duration::from_secs(10))
    }
}

impl KeepaliveConfig {
    /// Probe period is 90% of the read timeout
    pub fn from_timeouts(read_timeout: Duration, write_timeout: Duration) -> Self {
        let ping_period = (read_timeout * 9 / 10).max(Duration::from_millis(1));
        Self {
            read_timeout,
            write_timeout,
            ping_period,
        }
    }
}

impl From<&HubConfig> for KeepaliveConfig {
    fn from(config: &HubConfig) -> Self {
        Self::from_timeouts(
            Duration::from_secs(config.read_timeout_secs.max(1)),
            Duration::from_secs(config.write_timeout_secs.max(1)),
        )
    }
}

// ============================================================================
// WRITER
// ============================================================================

/// Why a writer stopped
#[derive(Debug)]
pub enum WriterExit {
    /// The hub released the queue; a close frame was attempted
    QueueClosed,
    WriteFailed(TransportError),
    ProbeFailed(TransportError),
    /// Cancelled or panicked before finishing
    Aborted,
}

impl WriterExit {
    pub fn is_graceful(&self) -> bool {
        matches!(self, WriterExit::QueueClosed)
    }
}

/// Drive the outbound half of a connection until the queue closes or a
/// write fails
pub async fn run_keepalive<S: FrameSink>(
    mut sink: S,
    mut outbound: mpsc::Receiver<Payload>,
    config: KeepaliveConfig,
    client_id: ClientId,
    metrics: Arc<ConnectionMetrics>,
) -> WriterExit {
    // First probe one full period after start, not immediately
    let mut probe = interval_at(Instant::now() + config.ping_period, config.ping_period);
    probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            item = outbound.recv() => match item {
                Some(payload) => {
                    let result =
                        with_deadline(config.write_timeout, "write", sink.send_payload(payload)).await;
                    if let Err(e) = result {
                        logger::debug(
                            LogTag::Connection,
                            &format!("Client {}: write failed: {}", client_id, e),
                        );
                        return WriterExit::WriteFailed(e);
                    }
                    metrics.inc_sent();
                }
                None => {
                    if let Err(e) = with_deadline(config.write_timeout, "close", sink.close()).await {
                        // Peer usually gone already
                        if logger::is_debug_enabled(LogTag::Connection) {
                            logger::debug(
                                LogTag::Connection,
                                &format!("Client {}: close frame not sent: {}", client_id, e),
                            );
                        }
                    }
                    return WriterExit::QueueClosed;
                }
            },
            _ = probe.tick() => {
                if let Err(e) = with_deadline(config.write_timeout, "ping", sink.send_ping()).await {
                    logger::debug(
                        LogTag::Connection,
                        &format!("Client {}: probe failed: {}", client_id, e),
                    );
                    return WriterExit::ProbeFailed(e);
                }
                metrics.inc_probe();
            }
        }
    }
}

async fn with_deadline<F>(
    deadline: Duration,
    operation: &'static str,
    write: F,
) -> Result<(), TransportError>
where
    F: Future<Output = Result<(), TransportError>>,
{
    match timeout(deadline, write).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout {
            operation,
            deadline,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::{memory_transport, OutboundFrame};

    fn payload(s: &str) -> Payload {
        Payload::from(s.as_bytes())
    }

    #[test]
    fn test_ping_period_is_ninety_percent_of_read_timeout() {
        let config = KeepaliveConfig::default();
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert_eq!(config.ping_period, Duration::from_secs(54));

        let custom = KeepaliveConfig::from(&HubConfig {
            read_timeout_secs: 20,
            write_timeout_secs: 5,
            ..HubConfig::default()
        });
        assert_eq!(custom.ping_period, Duration::from_secs(18));
        assert_eq!(custom.write_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_forwards_in_order_then_closes() {
        let (sink, _source, mut peer) = memory_transport(8);
        let (tx, rx) = mpsc::channel(4);
        let metrics = ConnectionMetrics::new();

        tx.send(payload("one")).await.unwrap();
        tx.send(payload("two")).await.unwrap();
        drop(tx);

        let exit = run_keepalive(
            sink,
            rx,
            KeepaliveConfig::default(),
            ClientId(1),
            metrics.clone(),
        )
        .await;

        assert!(exit.is_graceful());
        assert_eq!(peer.recv().await.unwrap().as_text(), Some("one"));
        assert_eq!(peer.recv().await.unwrap().as_text(), Some("two"));
        assert_eq!(peer.recv().await, Some(OutboundFrame::Close));
        assert_eq!(metrics.snapshot().frames_sent, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_sent_after_one_period() {
        let (sink, _source, mut peer) = memory_transport(8);
        let (_tx, rx) = mpsc::channel::<Payload>(4);
        let metrics = ConnectionMetrics::new();
        let started = Instant::now();

        let writer = tokio::spawn(run_keepalive(
            sink,
            rx,
            KeepaliveConfig::default(),
            ClientId(2),
            metrics.clone(),
        ));

        assert_eq!(peer.recv().await, Some(OutboundFrame::Ping));
        assert!(started.elapsed() >= Duration::from_secs(54));
        assert!(started.elapsed() < Duration::from_secs(60));

        assert_eq!(peer.recv().await, Some(OutboundFrame::Ping));
        assert!(started.elapsed() >= Duration::from_secs(108));
        assert_eq!(metrics.snapshot().probes_sent, 2);
        writer.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_peer_hits_write_deadline() {
        // Room for one frame; the peer never reads
        let (sink, _source, _peer) = memory_transport(1);
        let (tx, rx) = mpsc::channel(4);
        tx.send(payload("fits")).await.unwrap();
        tx.send(payload("stalls")).await.unwrap();

        let started = Instant::now();
        let exit = run_keepalive(
            sink,
            rx,
            KeepaliveConfig::default(),
            ClientId(3),
            ConnectionMetrics::new(),
        )
        .await;

        match exit {
            WriterExit::WriteFailed(TransportError::Timeout { operation, deadline }) => {
                assert_eq!(operation, "write");
                assert_eq!(deadline, Duration::from_secs(10));
            }
            other => panic!("unexpected exit: {:?}", other),
        }
        assert!(started.elapsed() >= Duration::from_secs(10));
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_to_vanished_peer_ends_writer() {
        let (sink, _source, peer) = memory_transport(4);
        drop(peer);
        let (_tx, rx) = mpsc::channel::<Payload>(4);

        let exit = run_keepalive(
            sink,
            rx,
            KeepaliveConfig::default(),
            ClientId(4),
            ConnectionMetrics::new(),
        )
        .await;

        assert!(matches!(exit, WriterExit::ProbeFailed(TransportError::Closed)));
    }
}
