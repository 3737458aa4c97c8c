//! Outbound delivery seam between the dispatcher and the transport.

use std::future::Future;

use super::events::ServerEvent;
use crate::registry::ConnectionId;

/// Fire-and-forget delivery of server events to connections.
///
/// Implementations must not block on slow receivers; undeliverable events
/// are dropped.
pub trait EventSink: Send + Sync + 'static {
    fn send_to(&self, id: &ConnectionId, event: ServerEvent) -> impl Future<Output = ()> + Send;

    fn send_to_many(
        &self,
        ids: &[ConnectionId],
        event: ServerEvent,
    ) -> impl Future<Output = ()> + Send {
        async move {
            for id in ids {
                self.send_to(id, event.clone()).await;
            }
        }
    }
}
