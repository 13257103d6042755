/// Client records: the hub's side and the connection's side of one queue
use std::fmt;
use tokio::sync::mpsc;

use super::Payload;

/// Connection identity (unique per registration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a non-blocking delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Queue at capacity: the client is too slow and gets evicted
    Full,
    /// The writer side is gone
    Closed,
}

/// Registry entry owned by the dispatch loop
///
/// Dropping it closes the client's queue, which its writer reads as
/// "finish gracefully".
#[derive(Debug)]
pub struct ClientRecord {
    id: ClientId,
    queue: mpsc::Sender<Payload>,
}

impl ClientRecord {
    pub(crate) fn new(id: ClientId, queue: mpsc::Sender<Payload>) -> Self {
        Self { id, queue }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Enqueue without waiting
    pub fn try_deliver(&self, payload: Payload) -> Delivery {
        match self.queue.try_send(payload) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Connection-side handle returned by `Hub::register`
#[derive(Debug)]
pub struct ClientHandle {
    pub id: ClientId,
    /// Everything the hub sends to this client, in dispatch order
    pub outbound: mpsc::Receiver<Payload>,
}
