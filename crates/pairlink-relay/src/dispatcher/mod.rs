//! Relay protocol: turns inbound client events into registry operations and
//! outbound sends.

pub mod events;
pub mod relay;
pub mod sink;

pub use events::{ClientEvent, ErrorReason, ServerEvent};
pub use relay::RelayDispatcher;
pub use sink::EventSink;
