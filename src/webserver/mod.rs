//! HTTP surface of the hub
//!
//! Thin axum layer: the WebSocket upgrade that feeds connections into the
//! hub, plus health and snapshot diagnostics.

mod server;

pub mod routes;
pub mod state;

pub use server::{build_app, serve, shutdown, start_server};
pub use state::AppState;
