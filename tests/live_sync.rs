#![cfg(feature = "web")]

//! End-to-end: real axum server, real WebSocket clients

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use livesync::config::ServerConfig;
use livesync::live::{Hub, HubSettings, SessionSettings};
use livesync::webserver::{build_app, AppState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start() -> (SocketAddr, Hub) {
    let hub = Hub::spawn(HubSettings::default());
    let state = Arc::new(AppState::new(
        hub.clone(),
        SessionSettings::default(),
        ServerConfig::default(),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_app(state)).await.unwrap();
    });
    (addr, hub)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    client
}

async fn next_text(client: &mut Client) -> String {
    loop {
        let message = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("websocket error");
        match message {
            Message::Text(text) => return text,
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected message: {:?}", other),
        }
    }
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_late_joiner_gets_replay_and_count() {
    let (addr, _hub) = start().await;
    let scene = r#"{"type":"sceneUpdate","slide":1}"#;

    let mut controller = connect(addr).await;
    assert_eq!(next_text(&mut controller).await, r#"{"type":"clientCount","count":1}"#);

    controller.send(Message::Text(scene.to_string())).await.unwrap();
    // Echo means the scene is cached and broadcast
    assert_eq!(next_text(&mut controller).await, scene);

    let mut display = connect(addr).await;
    assert_eq!(next_text(&mut display).await, scene);
    assert_eq!(next_text(&mut display).await, r#"{"type":"clientCount","count":2}"#);
    assert_eq!(next_text(&mut controller).await, r#"{"type":"clientCount","count":2}"#);

    display.close(None).await.unwrap();
    assert_eq!(next_text(&mut controller).await, r#"{"type":"clientCount","count":1}"#);
}

#[tokio::test]
async fn test_health_and_snapshot_endpoints() {
    let (addr, _hub) = start().await;

    let mut client = connect(addr).await;
    next_text(&mut client).await;
    client
        .send(Message::Text(r#"{"type":"coverUpdate","title":"Grace"}"#.to_string()))
        .await
        .unwrap();
    next_text(&mut client).await;

    let health = http_get(addr, "/health").await;
    assert!(health.starts_with("HTTP/1.1 200"));
    assert!(health.contains(r#""status":"ok""#));
    assert!(health.contains(r#""clients":1"#));

    let snapshot = http_get(addr, "/api/live/snapshot").await;
    assert!(snapshot.contains(r#""cover":true"#));
    assert!(snapshot.contains(r#""scene":false"#));
}
