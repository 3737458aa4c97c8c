//! pairlink Relay Server Library
//!
//! Core functionality for the pairlink relay:
//! - Room registry: code allocation, pairing, connection lookup
//! - Dispatcher: create/join/relay/disconnect protocol
//! - Connection hub and WebSocket transport

pub mod dispatcher;
pub mod registry;
pub mod transport;
