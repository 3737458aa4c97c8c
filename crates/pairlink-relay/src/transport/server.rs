//! HTTP routes and shared application state.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use pairlink_core::Config;

use super::hub::ConnectionHub;
use super::socket;
use crate::dispatcher::RelayDispatcher;
use crate::registry::{CodeGenerator, RoomRegistry};

/// Shared application state passed to axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: RelayDispatcher<ConnectionHub>,
    pub hub: Arc<ConnectionHub>,
    pub ping_interval: Duration,
}

impl AppState {
    pub fn new(registry: Arc<RoomRegistry>, hub: Arc<ConnectionHub>, ping_interval: Duration) -> Self {
        Self {
            dispatcher: RelayDispatcher::new(registry, Arc::clone(&hub)),
            hub,
            ping_interval,
        }
    }

    /// Build a fresh registry and hub from configuration.
    pub fn from_config(config: &Config) -> Self {
        let registry = Arc::new(RoomRegistry::new(CodeGenerator::from_config(&config.codes)));
        let hub = Arc::new(ConnectionHub::new(config.transport.send_queue));
        Self::new(registry, hub, config.transport.ping_interval())
    }
}

/// Build the axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/relay", get(ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// `GET /`
async fn root() -> &'static str {
    "pairlink relay is running."
}

/// `GET /health`
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "rooms": state.dispatcher.registry().len().await,
        "connections": state.hub.connection_count().await,
    }))
}

/// `GET /relay` — WebSocket upgrade.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| socket::handle_socket(socket, state))
}
