//! Per-connection WebSocket loops.
//!
//! Each socket gets a writer task draining its hub queue (plus periodic
//! pings) and a reader loop feeding the dispatcher. Whichever finishes first
//! ends the connection; the dispatcher then sees exactly one disconnect.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::server::AppState;
use crate::dispatcher::{ClientEvent, ErrorReason, EventSink, ServerEvent};
use crate::registry::ConnectionId;

pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let (id, rx) = state.hub.register().await;
    info!(connection = %id, "WebSocket client connected");

    let (ws_tx, ws_rx) = socket.split();
    let mut writer = tokio::spawn(write_loop(ws_tx, rx, state.ping_interval, id.clone()));

    tokio::select! {
        () = read_loop(ws_rx, &id, &state) => {}
        _ = &mut writer => {}
    }

    state.dispatcher.on_disconnect(&id).await;
    state.hub.unregister(&id).await;
    writer.abort();
    info!(connection = %id, "WebSocket client disconnected");
}

async fn read_loop(mut ws_rx: SplitStream<WebSocket>, id: &ConnectionId, state: &AppState) {
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => state.dispatcher.handle(id, event).await,
                Err(e) => {
                    debug!(connection = %id, error = %e, "Malformed client frame");
                    state
                        .hub
                        .send_to(id, ServerEvent::error(ErrorReason::BadRequest, e.to_string()))
                        .await;
                }
            },
            Ok(Message::Close(_)) => break,
            // Pings are answered by axum; binary frames are not part of the protocol.
            Ok(_) => {}
            Err(e) => {
                debug!(connection = %id, error = %e, "WebSocket read error");
                break;
            }
        }
    }
}

async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<ServerEvent>,
    ping_interval: Duration,
    id: ConnectionId,
) {
    let mut ping = tokio::time::interval(ping_interval);
    ping.tick().await; // consume first immediate tick

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!(connection = %id, error = %e, "Failed to serialize event");
                        continue;
                    }
                };
                if ws_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
                trace!(connection = %id, "Sent ping");
            }
        }
    }
}
