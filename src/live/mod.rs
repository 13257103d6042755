//! Live presentation state hub
//!
//! - `hub`: dispatch loop owning the client registry, plus its `Hub` handle
//! - `session`: one connection end to end (register, read loop, teardown)
//! - `health`: keepalive writer (queue drain, probes, write deadlines)
//! - `snapshot`: last payload per category, replayed to joiners
//! - `message`: categories, envelope classifier, `clientCount` message
//! - `client`: registry entries and connection-side handles
//! - `metrics`: hub and per-connection counters

pub mod client;
pub mod health;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod session;
pub mod snapshot;

use std::sync::Arc;

/// Opaque message bytes, shared between every queue they are fanned out to
pub type Payload = Arc<[u8]>;

pub use client::{ClientHandle, ClientId};
pub use health::{KeepaliveConfig, WriterExit};
pub use hub::{Hub, HubSettings};
pub use message::{classify, client_count_message, Category, REPLAY_ORDER};
pub use metrics::HubMetricsSnapshot;
pub use session::{serve_connection, CloseReason, SessionOutcome, SessionSettings};
pub use snapshot::SnapshotCache;
