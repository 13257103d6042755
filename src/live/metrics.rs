/// Hub and connection counters
///
/// Written by the dispatch loop and connection tasks, read from anywhere
/// (health endpoint, close logs) without touching the registry.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// HUB METRICS
// ============================================================================

#[derive(Debug, Default)]
pub struct HubMetrics {
    /// Registrations over the process lifetime
    total_connections: AtomicU64,

    /// Currently registered clients
    active_connections: AtomicUsize,

    /// Broadcast events processed
    broadcasts: AtomicU64,

    /// Payloads placed on client queues (broadcast, replay, counts)
    messages_delivered: AtomicU64,

    /// Clients dropped because their queue was full or gone
    evictions: AtomicU64,
}

impl HubMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        // Only called for clients that were registered, so this never underflows
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn broadcast_processed(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_delivered(&self) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_evicted(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubMetricsSnapshot {
    pub total_connections: u64,
    pub active_connections: usize,
    pub broadcasts: u64,
    pub messages_delivered: u64,
    pub evictions: u64,
}

// ============================================================================
// CONNECTION METRICS
// ============================================================================

/// Per-connection counters, shared by its reader and writer tasks
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    frames_sent: AtomicU64,
    probes_sent: AtomicU64,
    payloads_received: AtomicU64,
    payloads_cached: AtomicU64,
}

impl ConnectionMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_probe(&self) {
        self.probes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_received(&self) {
        self.payloads_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cached(&self) {
        self.payloads_cached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConnectionMetricsSnapshot {
        ConnectionMetricsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            probes_sent: self.probes_sent.load(Ordering::Relaxed),
            payloads_received: self.payloads_received.load(Ordering::Relaxed),
            payloads_cached: self.payloads_cached.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionMetricsSnapshot {
    pub frames_sent: u64,
    pub probes_sent: u64,
    pub payloads_received: u64,
    pub payloads_cached: u64,
}
