//! Per-connection outbound queues.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::dispatcher::{EventSink, ServerEvent};
use crate::registry::ConnectionId;

/// Thread-safe map of live connections to their outbound queues.
pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<ServerEvent>>>,
    queue_len: usize,
}

impl ConnectionHub {
    pub fn new(queue_len: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            queue_len,
        }
    }

    /// Register a new connection, returning its id and the receiving end of
    /// its outbound queue.
    pub async fn register(&self) -> (ConnectionId, mpsc::Receiver<ServerEvent>) {
        let id = ConnectionId::random();
        let (tx, rx) = mpsc::channel(self.queue_len);
        self.connections.write().await.insert(id.clone(), tx);
        info!(connection = %id, "Connection registered");
        (id, rx)
    }

    /// Remove a connection.
    pub async fn unregister(&self, id: &ConnectionId) {
        if self.connections.write().await.remove(id).is_some() {
            info!(connection = %id, "Connection unregistered");
        } else {
            warn!(connection = %id, "Tried to unregister unknown connection");
        }
    }

    pub async fn is_connected(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }

    /// Count of live connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for ConnectionHub {
    async fn send_to(&self, id: &ConnectionId, event: ServerEvent) {
        let Some(tx) = self.connections.read().await.get(id).cloned() else {
            debug!(connection = %id, "Dropping event for unknown connection");
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(connection = %id, "Send queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(connection = %id, "Send queue closed, dropping event");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_and_unregister() {
        let hub = ConnectionHub::default();
        let (id, _rx) = hub.register().await;

        assert!(hub.is_connected(&id).await);
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert!(!hub.is_connected(&id).await);
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn send_reaches_only_target() {
        let hub = ConnectionHub::default();
        let (a, mut rx_a) = hub.register().await;
        let (_b, mut rx_b) = hub.register().await;

        hub.send_to(&a, ServerEvent::PartnerDisconnected).await;

        assert_eq!(rx_a.recv().await.unwrap(), ServerEvent::PartnerDisconnected);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_many_fans_out() {
        let hub = ConnectionHub::default();
        let (a, mut rx_a) = hub.register().await;
        let (b, mut rx_b) = hub.register().await;

        hub.send_to_many(&[a, b], ServerEvent::ConnectionEstablished)
            .await;

        assert_eq!(rx_a.recv().await.unwrap(), ServerEvent::ConnectionEstablished);
        assert_eq!(rx_b.recv().await.unwrap(), ServerEvent::ConnectionEstablished);
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let hub = ConnectionHub::new(1);
        let (a, mut rx) = hub.register().await;

        hub.send_to(&a, ServerEvent::ConnectionEstablished).await;
        hub.send_to(&a, ServerEvent::PartnerDisconnected).await;

        assert_eq!(rx.recv().await.unwrap(), ServerEvent::ConnectionEstablished);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_unknown_connection_is_noop() {
        let hub = ConnectionHub::default();
        hub.send_to(&"ghost".into(), ServerEvent::PartnerDisconnected)
            .await;
        assert_eq!(hub.connection_count().await, 0);
    }
}
