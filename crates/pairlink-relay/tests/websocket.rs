#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Pairing and relay over real WebSocket connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use pairlink_core::Config;
use pairlink_relay::registry::RoomRegistry;
use pairlink_relay::transport::{AppState, build_router};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a relay on an ephemeral port that only ever hands out `482913`.
async fn spawn_relay() -> (SocketAddr, Arc<RoomRegistry>) {
    let mut config = Config::default();
    config.codes.min = 482_913;
    config.codes.max = 482_913;
    let state = AppState::from_config(&config);
    let registry = Arc::clone(state.dispatcher.registry());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    (addr, registry)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/relay")).await.unwrap();
    ws
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

/// Next JSON text frame, skipping control frames.
async fn recv(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn end_to_end_over_websocket() {
    let (addr, registry) = spawn_relay().await;
    let mut controller = connect(addr).await;
    let mut peer = connect(addr).await;

    send(&mut controller, json!({"event": "CreateRoom"})).await;
    assert_eq!(
        recv(&mut controller).await,
        json!({"event": "RoomCreated", "code": "482913"})
    );

    send(&mut peer, json!({"event": "JoinRoom", "code": "482913"})).await;
    assert_eq!(
        recv(&mut controller).await,
        json!({"event": "ConnectionEstablished"})
    );
    assert_eq!(recv(&mut peer).await, json!({"event": "ConnectionEstablished"}));

    send(
        &mut controller,
        json!({"event": "SendMessageToPartner", "payload": "hello"}),
    )
    .await;
    assert_eq!(
        recv(&mut peer).await,
        json!({"event": "ReceiveMessage", "payload": "hello"})
    );

    peer.close(None).await.unwrap();
    assert_eq!(
        recv(&mut controller).await,
        json!({"event": "PartnerDisconnected"})
    );
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn unknown_code_rejected_to_caller() {
    let (addr, _registry) = spawn_relay().await;
    let mut peer = connect(addr).await;

    send(&mut peer, json!({"event": "JoinRoom", "code": "000000"})).await;
    let reply = recv(&mut peer).await;
    assert_eq!(reply["event"], "Error");
    assert_eq!(reply["reason"], "room_not_found");
}

#[tokio::test]
async fn malformed_frame_gets_bad_request() {
    let (addr, _registry) = spawn_relay().await;
    let mut client = connect(addr).await;

    client.send(Message::text("not json")).await.unwrap();
    let reply = recv(&mut client).await;
    assert_eq!(reply["event"], "Error");
    assert_eq!(reply["reason"], "bad_request");

    // The connection stays usable afterwards.
    send(&mut client, json!({"event": "CreateRoom"})).await;
    assert_eq!(recv(&mut client).await["event"], "RoomCreated");
}

#[tokio::test]
async fn controller_leaving_before_join_frees_code() {
    let (addr, registry) = spawn_relay().await;
    let mut first = connect(addr).await;

    send(&mut first, json!({"event": "CreateRoom"})).await;
    assert_eq!(recv(&mut first).await["code"], "482913");
    first.close(None).await.unwrap();

    // Close handling is asynchronous on the server side.
    for _ in 0..100 {
        if registry.is_empty().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(registry.is_empty().await);

    let mut second = connect(addr).await;
    send(&mut second, json!({"event": "CreateRoom"})).await;
    assert_eq!(
        recv(&mut second).await,
        json!({"event": "RoomCreated", "code": "482913"})
    );
}
