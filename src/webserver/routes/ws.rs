/// WebSocket endpoint feeding connections into the hub
///
/// The axum socket is split and wrapped in the transport traits; from
/// there on the connection is served by `live::serve_connection`.
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};

use crate::{
    arguments::is_debug_webserver_enabled,
    errors::TransportError,
    live::{serve_connection, Payload},
    logger::{self, LogTag},
    transport::{FrameSink, FrameSource, InboundFrame},
    webserver::state::AppState,
};

/// GET /ws (path configurable)
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    if is_debug_webserver_enabled() {
        logger::debug(LogTag::Webserver, "WebSocket upgrade requested");
    }

    ws.max_message_size(state.session.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sink, source) = split_socket(socket);

    if let Err(e) = serve_connection(&state.hub, sink, source, state.session).await {
        logger::warning(
            LogTag::Webserver,
            &format!("WebSocket connection rejected: {}", e),
        );
    }
}

/// Split an upgraded socket into the hub-facing halves
pub fn split_socket(socket: WebSocket) -> (WsSink, WsSource) {
    let (tx, rx) = socket.split();
    (WsSink { inner: tx }, WsSource { inner: rx })
}

pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

pub struct WsSource {
    inner: SplitStream<WebSocket>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_payload(&mut self, payload: Payload) -> Result<(), TransportError> {
        // Text when it is text, so browsers get strings back
        let message = match std::str::from_utf8(&payload) {
            Ok(text) => Message::Text(text.to_owned()),
            Err(_) => Message::Binary(payload.to_vec()),
        };
        self.inner
            .send(message)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn send_ping(&mut self) -> Result<(), TransportError> {
        self.inner
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inner
            .send(Message::Close(None))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Option<Result<InboundFrame, TransportError>> {
        let message = match self.inner.next().await? {
            Ok(message) => message,
            Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
        };

        let frame = match message {
            Message::Text(text) => InboundFrame::Payload(Payload::from(text.into_bytes())),
            Message::Binary(bytes) => InboundFrame::Payload(Payload::from(bytes)),
            Message::Ping(_) => InboundFrame::Ping,
            Message::Pong(_) => InboundFrame::Pong,
            Message::Close(_) => InboundFrame::Close,
        };
        Some(Ok(frame))
    }
}
