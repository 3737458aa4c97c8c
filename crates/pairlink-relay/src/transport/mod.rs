//! WebSocket transport: connection hub, HTTP routes, and socket loops.

pub mod hub;
pub mod server;
pub mod socket;

pub use hub::ConnectionHub;
pub use server::{AppState, build_router};
