//! Room protocol handling on top of the registry.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::events::{ClientEvent, ServerEvent};
use super::sink::EventSink;
use crate::registry::{ConnectionId, RoomCode, RoomRegistry};

/// Applies the create/join/relay/disconnect protocol for each inbound event.
pub struct RelayDispatcher<S> {
    registry: Arc<RoomRegistry>,
    sink: Arc<S>,
}

impl<S> Clone for RelayDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S: EventSink> RelayDispatcher<S> {
    pub const fn new(registry: Arc<RoomRegistry>, sink: Arc<S>) -> Self {
        Self { registry, sink }
    }

    pub const fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Route one inbound event from `sender`.
    pub async fn handle(&self, sender: &ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom => self.on_create(sender).await,
            ClientEvent::JoinRoom { code } => self.on_join(sender, &code).await,
            ClientEvent::SendMessageToPartner { payload } => {
                self.on_message(sender, payload).await;
            }
        }
    }

    #[instrument(skip(self, sender), fields(connection = %sender))]
    pub async fn on_create(&self, sender: &ConnectionId) {
        match self.registry.create(sender.clone()).await {
            Ok(code) => {
                self.sink
                    .send_to(sender, ServerEvent::RoomCreated { code })
                    .await;
            }
            Err(e) => {
                warn!(error = %e, "Room creation rejected");
                self.sink.send_to(sender, ServerEvent::from(&e)).await;
            }
        }
    }

    #[instrument(skip(self, sender, code), fields(connection = %sender, code = %code))]
    pub async fn on_join(&self, sender: &ConnectionId, code: &RoomCode) {
        match self.registry.join(code, sender.clone()).await {
            Ok(_) => self.on_join_succeeded(code).await,
            Err(e) => {
                warn!(error = %e, "Join rejected");
                self.sink.send_to(sender, ServerEvent::from(&e)).await;
            }
        }
    }

    /// Tell both members the pairing is live.
    pub async fn on_join_succeeded(&self, code: &RoomCode) {
        let Some(session) = self.registry.get(code).await else {
            // Torn down between the join and this notification.
            debug!(code = %code, "Room gone before pairing notice");
            return;
        };
        self.sink
            .send_to_many(&session.members(), ServerEvent::ConnectionEstablished)
            .await;
    }

    /// Forward `payload` to every other member of the sender's room.
    pub async fn on_message(&self, sender: &ConnectionId, payload: String) {
        let Some(session) = self.registry.resolve(sender).await else {
            debug!(connection = %sender, "Dropping message from connection without a room");
            return;
        };
        let recipients = session.others(sender);
        if recipients.is_empty() {
            debug!(code = %session.code, "Dropping message, no partner yet");
            return;
        }
        debug!(
            code = %session.code,
            bytes = payload.len(),
            recipients = recipients.len(),
            "Relaying message"
        );
        self.sink
            .send_to_many(&recipients, ServerEvent::ReceiveMessage { payload })
            .await;
    }

    /// Close the room `connection` was in and notify whoever is left.
    pub async fn on_disconnect(&self, connection: &ConnectionId) {
        let Some(session) = self.registry.leave(connection).await else {
            return;
        };
        let others = session.others(connection);
        info!(
            code = %session.code,
            connection = %connection,
            notified = others.len(),
            "Member disconnected, room closed"
        );
        self.sink
            .send_to_many(&others, ServerEvent::PartnerDisconnected)
            .await;
    }

    /// Close unpaired rooms older than `max_age`, telling each controller.
    ///
    /// Returns the number of rooms closed.
    pub async fn expire_idle(&self, max_age: Duration) -> usize {
        let expired = self.registry.sweep_idle(max_age).await;
        for session in &expired {
            info!(code = %session.code, controller = %session.controller, "Idle room expired");
            self.sink
                .send_to(
                    &session.controller,
                    ServerEvent::RoomExpired {
                        code: session.code.clone(),
                    },
                )
                .await;
        }
        expired.len()
    }

    /// Run [`Self::expire_idle`] every `every` until the handle is aborted.
    pub fn spawn_idle_sweeper(&self, max_age: Duration, every: Duration) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await; // Skip first immediate tick
            loop {
                interval.tick().await;
                let expired = dispatcher.expire_idle(max_age).await;
                if expired > 0 {
                    debug!(expired, "Idle sweep completed");
                }
            }
        })
    }
}
