/// Live state hub: the dispatch loop and its handle
///
/// One task owns the client registry. Registrations, unregistrations and
/// broadcasts reach it as events on a single ordered queue, so registry
/// changes and fan-out never interleave and need no lock. The snapshot
/// cache is the only state shared outside that task.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::arguments::is_debug_hub_enabled;
use crate::config::HubConfig;
use crate::errors::HubError;
use crate::logger::{self, LogTag};

use super::client::{ClientHandle, ClientId, ClientRecord, Delivery};
use super::message::{client_count_message, Category};
use super::metrics::{HubMetrics, HubMetricsSnapshot};
use super::snapshot::SnapshotCache;
use super::Payload;

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    /// Outbound queue size per client
    pub client_queue_capacity: usize,
    /// Events buffered ahead of the dispatch loop
    pub event_queue_capacity: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            client_queue_capacity: 256,
            event_queue_capacity: 256,
        }
    }
}

impl From<&HubConfig> for HubSettings {
    fn from(config: &HubConfig) -> Self {
        Self {
            client_queue_capacity: config.client_queue_capacity.max(1),
            event_queue_capacity: config.broadcast_queue_capacity.max(1),
        }
    }
}

// ============================================================================
// EVENTS
// ============================================================================

enum HubEvent {
    Register(ClientRecord),
    Unregister(ClientId),
    Broadcast(Payload),
}

#[derive(Debug, Clone, Copy)]
enum RemovalReason {
    Unregistered,
    QueueFull,
    QueueClosed,
}

impl RemovalReason {
    fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Unregistered => "unregistered",
            RemovalReason::QueueFull => "evicted (queue full)",
            RemovalReason::QueueClosed => "evicted (writer gone)",
        }
    }
}

// ============================================================================
// HUB HANDLE
// ============================================================================

/// Cloneable handle to a running hub
///
/// Construct once at startup and pass to every connection. The dispatch
/// loop exits when the last handle is dropped.
#[derive(Clone)]
pub struct Hub {
    events: mpsc::Sender<HubEvent>,
    snapshot: Arc<SnapshotCache>,
    metrics: Arc<HubMetrics>,
    next_client_id: Arc<AtomicU64>,
    settings: HubSettings,
}

impl Hub {
    /// Start the dispatch loop on the current tokio runtime
    pub fn spawn(settings: HubSettings) -> Self {
        Self::spawn_with_handle(settings).0
    }

    /// Like `spawn`, also returning the dispatch task's handle
    pub fn spawn_with_handle(settings: HubSettings) -> (Self, JoinHandle<()>) {
        let (events_tx, events_rx) = mpsc::channel(settings.event_queue_capacity.max(1));
        let snapshot = Arc::new(SnapshotCache::new());
        let metrics = HubMetrics::new();

        let dispatcher = Dispatcher {
            clients: HashMap::new(),
            snapshot: snapshot.clone(),
            metrics: metrics.clone(),
        };
        let task = tokio::spawn(dispatcher.run(events_rx));

        let hub = Self {
            events: events_tx,
            snapshot,
            metrics,
            next_client_id: Arc::new(AtomicU64::new(1)),
            settings,
        };
        (hub, task)
    }

    /// Register a new client
    ///
    /// The returned queue first receives the cached state (fixed replay
    /// order), then the client count announcing this join.
    pub async fn register(&self) -> Result<ClientHandle, HubError> {
        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.settings.client_queue_capacity.max(1));

        self.events
            .send(HubEvent::Register(ClientRecord::new(id, tx)))
            .await
            .map_err(|_| HubError::Stopped)?;

        Ok(ClientHandle { id, outbound: rx })
    }

    /// Remove a client; unknown or already removed ids are ignored
    pub async fn unregister(&self, id: ClientId) -> Result<(), HubError> {
        self.events
            .send(HubEvent::Unregister(id))
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// Queue a payload for delivery to every registered client
    pub async fn broadcast(&self, payload: Payload) -> Result<(), HubError> {
        self.events
            .send(HubEvent::Broadcast(payload))
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// Record the latest payload for a category (last write wins)
    pub fn set_last(&self, category: Category, payload: Payload) {
        self.snapshot.set_last(category, payload);
    }

    pub fn snapshot(&self) -> &SnapshotCache {
        &self.snapshot
    }

    pub fn metrics(&self) -> HubMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Currently registered clients, as last published by the dispatch loop
    pub fn client_count(&self) -> usize {
        self.metrics.active_connections()
    }

    pub fn settings(&self) -> HubSettings {
        self.settings
    }
}

// ============================================================================
// DISPATCH LOOP
// ============================================================================

/// State owned exclusively by the dispatch task
struct Dispatcher {
    clients: HashMap<ClientId, ClientRecord>,
    snapshot: Arc<SnapshotCache>,
    metrics: Arc<HubMetrics>,
}

impl Dispatcher {
    async fn run(mut self, mut events: mpsc::Receiver<HubEvent>) {
        logger::debug(LogTag::Hub, "Dispatch loop started");

        while let Some(event) = events.recv().await {
            match event {
                HubEvent::Register(client) => self.handle_register(client),
                HubEvent::Unregister(id) => self.handle_unregister(id),
                HubEvent::Broadcast(payload) => self.handle_broadcast(payload),
            }
        }

        logger::debug(
            LogTag::Hub,
            &format!(
                "Dispatch loop stopped ({} clients abandoned)",
                self.clients.len()
            ),
        );
    }

    fn handle_register(&mut self, client: ClientRecord) {
        let id = client.id();
        self.clients.insert(id, client);
        self.metrics.connection_opened();

        if logger::is_debug_enabled(LogTag::Hub) {
            logger::debug(
                LogTag::Hub,
                &format!("Client {} registered (active={})", id, self.clients.len()),
            );
        }

        if self.replay_snapshot(id) {
            self.announce_client_count();
        }
    }

    /// Deliver cached state to one client; false if it was evicted doing so
    fn replay_snapshot(&mut self, id: ClientId) -> bool {
        let replay = self.snapshot.replay();
        let Some(client) = self.clients.get(&id) else {
            return false;
        };

        let mut failure = None;
        for (category, payload) in replay {
            match client.try_deliver(payload) {
                Delivery::Delivered => self.metrics.message_delivered(),
                Delivery::Full => {
                    failure = Some((category, RemovalReason::QueueFull));
                    break;
                }
                Delivery::Closed => {
                    failure = Some((category, RemovalReason::QueueClosed));
                    break;
                }
            }
        }

        match failure {
            None => true,
            Some((category, reason)) => {
                logger::debug(
                    LogTag::Hub,
                    &format!("Client {} dropped during {} replay", id, category),
                );
                self.remove(id, reason);
                // The registry still changed (joined then left): tell the others
                self.announce_client_count();
                false
            }
        }
    }

    fn handle_unregister(&mut self, id: ClientId) {
        if self.remove(id, RemovalReason::Unregistered) {
            self.announce_client_count();
        } else if logger::is_debug_enabled(LogTag::Hub) {
            logger::debug(
                LogTag::Hub,
                &format!("Client {} already unregistered, ignoring", id),
            );
        }
    }

    fn handle_broadcast(&mut self, payload: Payload) {
        self.metrics.broadcast_processed();
        let evicted = self.fan_out(&payload);

        if is_debug_hub_enabled() {
            logger::debug(
                LogTag::Hub,
                &format!(
                    "Broadcast {} bytes (delivered={}, evicted={})",
                    payload.len(),
                    self.clients.len(),
                    evicted
                ),
            );
        }

        if evicted > 0 {
            self.announce_client_count();
        }
    }

    /// Offer a payload to every client without waiting; evict the ones
    /// that cannot take it. Returns the number evicted.
    fn fan_out(&mut self, payload: &Payload) -> usize {
        let mut evicted = Vec::new();
        for (id, client) in &self.clients {
            match client.try_deliver(payload.clone()) {
                Delivery::Delivered => self.metrics.message_delivered(),
                Delivery::Full => evicted.push((*id, RemovalReason::QueueFull)),
                Delivery::Closed => evicted.push((*id, RemovalReason::QueueClosed)),
            }
        }

        for (id, reason) in &evicted {
            self.remove(*id, *reason);
        }
        evicted.len()
    }

    /// Send the current count to everyone
    ///
    /// Evictions while announcing change the count again, so repeat until
    /// a round completes cleanly. Each repeat removes at least one client.
    fn announce_client_count(&mut self) {
        loop {
            let payload = client_count_message(self.clients.len());
            if self.fan_out(&payload) == 0 {
                break;
            }
        }
    }

    /// Drop a client's record (closing its queue). False if absent.
    fn remove(&mut self, id: ClientId, reason: RemovalReason) -> bool {
        let Some(record) = self.clients.remove(&id) else {
            return false;
        };
        self.metrics.connection_closed();
        if !matches!(reason, RemovalReason::Unregistered) {
            self.metrics.client_evicted();
        }

        if logger::is_debug_enabled(LogTag::Hub) {
            logger::debug(
                LogTag::Hub,
                &format!(
                    "Client {} {} (active={})",
                    id,
                    reason.as_str(),
                    self.clients.len()
                ),
            );
        }
        // Queue closes only after the counters are updated
        drop(record);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn payload(s: &str) -> Payload {
        Payload::from(s.as_bytes())
    }

    fn text(p: &Payload) -> String {
        String::from_utf8(p.to_vec()).unwrap()
    }

    fn count_message(n: usize) -> String {
        format!(r#"{{"type":"clientCount","count":{}}}"#, n)
    }

    async fn next(handle: &mut ClientHandle) -> String {
        let item = timeout(Duration::from_secs(2), handle.outbound.recv())
            .await
            .expect("timed out waiting for hub message")
            .expect("client queue closed");
        text(&item)
    }

    /// Wait until the dispatch loop has processed everything queued so far.
    /// Returns the number of clients registered besides the probe.
    async fn settle(hub: &Hub) -> usize {
        let mut probe = hub.register().await.unwrap();
        let count = loop {
            let msg = next(&mut probe).await;
            if let Some(rest) = msg.strip_prefix(r#"{"type":"clientCount","count":"#) {
                break rest.trim_end_matches('}').parse::<usize>().unwrap();
            }
        };
        hub.unregister(probe.id).await.unwrap();
        count - 1
    }

    #[tokio::test]
    async fn test_join_announces_count_to_everyone() {
        let hub = Hub::spawn(HubSettings::default());

        let mut a = hub.register().await.unwrap();
        assert_eq!(next(&mut a).await, count_message(1));

        let mut b = hub.register().await.unwrap();
        assert_eq!(next(&mut a).await, count_message(2));
        assert_eq!(next(&mut b).await, count_message(2));
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_replay_then_count_for_late_joiner() {
        let hub = Hub::spawn(HubSettings::default());
        let scene = r#"{"type":"sceneUpdate","slide":1}"#;
        let verse = r#"{"type":"verseUpdate","ref":"Gen 1:1"}"#;

        hub.set_last(Category::Scene, payload(scene));
        hub.set_last(Category::Verse, payload(verse));

        let mut late = hub.register().await.unwrap();
        assert_eq!(next(&mut late).await, scene);
        assert_eq!(next(&mut late).await, verse);
        assert_eq!(next(&mut late).await, count_message(1));
        assert!(late.outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_replay_covers_every_slot_in_fixed_order() {
        let hub = Hub::spawn(HubSettings::default());
        // Set in reverse to show order comes from the category, not arrival
        for category in super::super::message::REPLAY_ORDER.iter().rev() {
            hub.set_last(
                *category,
                payload(&format!(r#"{{"type":"{}"}}"#, category.message_type())),
            );
        }

        let mut client = hub.register().await.unwrap();
        let mut received = Vec::new();
        for _ in 0..6 {
            received.push(next(&mut client).await);
        }
        let expected: Vec<String> = super::super::message::REPLAY_ORDER
            .iter()
            .map(|c| format!(r#"{{"type":"{}"}}"#, c.message_type()))
            .collect();
        assert_eq!(received, expected);
        assert_eq!(next(&mut client).await, count_message(1));
    }

    #[tokio::test]
    async fn test_late_joiner_sees_only_last_write() {
        let hub = Hub::spawn(HubSettings::default());
        hub.set_last(Category::Lyrics, payload("P1"));
        hub.set_last(Category::Lyrics, payload("P2"));

        let mut client = hub.register().await.unwrap();
        assert_eq!(next(&mut client).await, "P2");
        assert_eq!(next(&mut client).await, count_message(1));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_clients_without_touching_cache() {
        let hub = Hub::spawn(HubSettings::default());
        let mut a = hub.register().await.unwrap();
        let mut b = hub.register().await.unwrap();
        assert_eq!(next(&mut a).await, count_message(1));
        assert_eq!(next(&mut a).await, count_message(2));
        assert_eq!(next(&mut b).await, count_message(2));

        hub.broadcast(payload(r#"{"type":"x"}"#)).await.unwrap();
        assert_eq!(next(&mut a).await, r#"{"type":"x"}"#);
        assert_eq!(next(&mut b).await, r#"{"type":"x"}"#);

        settle(&hub).await;
        assert!(hub.snapshot().replay().is_empty());
    }

    #[tokio::test]
    async fn test_client_registered_after_broadcast_does_not_receive_it() {
        let hub = Hub::spawn(HubSettings::default());
        let mut early = hub.register().await.unwrap();

        hub.broadcast(payload("before")).await.unwrap();
        let mut late = hub.register().await.unwrap();
        hub.broadcast(payload("after")).await.unwrap();

        assert_eq!(next(&mut early).await, count_message(1));
        assert_eq!(next(&mut early).await, "before");
        assert_eq!(next(&mut early).await, count_message(2));
        assert_eq!(next(&mut early).await, "after");

        assert_eq!(next(&mut late).await, count_message(2));
        assert_eq!(next(&mut late).await, "after");
    }

    #[tokio::test]
    async fn test_slow_consumer_is_evicted_others_still_served() {
        let hub = Hub::spawn(HubSettings {
            client_queue_capacity: 4,
            event_queue_capacity: 16,
        });

        // A never reads; B drains as it goes
        let mut slow = hub.register().await.unwrap();
        let mut fast = hub.register().await.unwrap();
        assert_eq!(next(&mut fast).await, count_message(2));

        // slow holds count(1), count(2); two more fill it
        hub.broadcast(payload("m1")).await.unwrap();
        hub.broadcast(payload("m2")).await.unwrap();
        assert_eq!(next(&mut fast).await, "m1");
        assert_eq!(next(&mut fast).await, "m2");

        hub.broadcast(payload("m3")).await.unwrap();
        assert_eq!(next(&mut fast).await, "m3");
        assert_eq!(next(&mut fast).await, count_message(1));

        // The evicted queue drains what it had, then reports closed
        let mut backlog = Vec::new();
        while let Some(item) = slow.outbound.recv().await {
            backlog.push(text(&item));
        }
        assert_eq!(
            backlog,
            vec![count_message(1), count_message(2), "m1".to_string(), "m2".to_string()]
        );

        assert_eq!(settle(&hub).await, 1);
        assert_eq!(hub.metrics().evictions, 1);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_evicted_on_next_broadcast() {
        let hub = Hub::spawn(HubSettings::default());
        let gone = hub.register().await.unwrap();
        let mut stays = hub.register().await.unwrap();
        assert_eq!(next(&mut stays).await, count_message(2));

        drop(gone);
        hub.broadcast(payload("hello")).await.unwrap();
        assert_eq!(next(&mut stays).await, "hello");
        assert_eq!(next(&mut stays).await, count_message(1));
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let hub = Hub::spawn(HubSettings::default());
        let mut a = hub.register().await.unwrap();
        let mut b = hub.register().await.unwrap();
        assert_eq!(next(&mut a).await, count_message(1));
        assert_eq!(next(&mut a).await, count_message(2));
        assert_eq!(next(&mut b).await, count_message(2));

        hub.unregister(b.id).await.unwrap();
        hub.unregister(b.id).await.unwrap();
        hub.unregister(ClientId(9_999)).await.unwrap();
        hub.broadcast(payload("marker")).await.unwrap();

        // Exactly one count update, then the marker: no double decrement
        assert_eq!(next(&mut a).await, count_message(1));
        assert_eq!(next(&mut a).await, "marker");

        // B's queue is closed after whatever it already had
        assert!(b.outbound.recv().await.is_none());
        assert_eq!(hub.client_count(), 1);
    }

    #[tokio::test]
    async fn test_replay_overflow_evicts_joiner() {
        let hub = Hub::spawn(HubSettings {
            client_queue_capacity: 2,
            event_queue_capacity: 16,
        });
        hub.set_last(Category::LiveStatus, payload("live"));
        hub.set_last(Category::Scene, payload("scene"));
        hub.set_last(Category::Cover, payload("cover"));

        let mut joiner = hub.register().await.unwrap();
        assert_eq!(next(&mut joiner).await, "live");
        assert_eq!(next(&mut joiner).await, "scene");
        assert!(joiner.outbound.recv().await.is_none());
        assert_eq!(hub.client_count(), 0);
        assert_eq!(hub.metrics().evictions, 1);
    }

    #[tokio::test]
    async fn test_dispatch_loop_stops_when_handles_dropped() {
        let (hub, task) = Hub::spawn_with_handle(HubSettings::default());
        drop(hub);
        timeout(Duration::from_secs(2), task)
            .await
            .expect("dispatch loop did not stop")
            .unwrap();
    }
}
