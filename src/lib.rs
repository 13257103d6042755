//! livesync: live presentation state hub
//!
//! Controllers publish state (scene, verse, lyrics, cover, on-air status)
//! over a WebSocket; every connected display receives it in real time,
//! including displays that join later.

pub mod arguments;
pub mod config;
pub mod errors;
pub mod live;
pub mod logger;
pub mod paths;
pub mod transport;

#[cfg(feature = "web")]
pub mod webserver;
