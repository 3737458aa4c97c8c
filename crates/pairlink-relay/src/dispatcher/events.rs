//! Wire events exchanged with clients.
//!
//! Every frame is a JSON object tagged by its `event` field, e.g.
//! `{"event":"JoinRoom","code":"482913"}`.

use serde::{Deserialize, Serialize};

use crate::registry::{JoinError, RegistryError, RoomCode};

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ClientEvent {
    CreateRoom,
    JoinRoom { code: RoomCode },
    SendMessageToPartner { payload: String },
}

/// Events the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ServerEvent {
    /// Sent to the creator only.
    RoomCreated { code: RoomCode },
    /// Sent to both members once a peer has joined.
    ConnectionEstablished,
    /// A payload relayed from the other member, unmodified.
    ReceiveMessage { payload: String },
    PartnerDisconnected,
    /// The room was closed for never being joined.
    RoomExpired { code: RoomCode },
    Error { reason: ErrorReason, message: String },
}

/// Machine-readable cause carried by [`ServerEvent::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    RoomNotFound,
    RoomFull,
    AlreadyInRoom,
    RegistryExhausted,
    BadRequest,
}

impl ServerEvent {
    pub fn error(reason: ErrorReason, message: impl Into<String>) -> Self {
        Self::Error {
            reason,
            message: message.into(),
        }
    }
}

impl From<&JoinError> for ServerEvent {
    fn from(err: &JoinError) -> Self {
        let reason = match err {
            JoinError::RoomNotFound(_) => ErrorReason::RoomNotFound,
            JoinError::RoomFull(_) => ErrorReason::RoomFull,
            JoinError::AlreadyMember { .. } => ErrorReason::AlreadyInRoom,
        };
        Self::error(reason, err.to_string())
    }
}

impl From<&RegistryError> for ServerEvent {
    fn from(err: &RegistryError) -> Self {
        let reason = match err {
            RegistryError::Exhausted { .. } => ErrorReason::RegistryExhausted,
            RegistryError::AlreadyMember { .. } => ErrorReason::AlreadyInRoom,
        };
        Self::error(reason, err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_client_events() {
        let create: ClientEvent = serde_json::from_str(r#"{"event":"CreateRoom"}"#).unwrap();
        assert_eq!(create, ClientEvent::CreateRoom);

        let join: ClientEvent =
            serde_json::from_str(r#"{"event":"JoinRoom","code":"482913"}"#).unwrap();
        assert_eq!(join, ClientEvent::JoinRoom { code: "482913".into() });

        let send: ClientEvent =
            serde_json::from_str(r#"{"event":"SendMessageToPartner","payload":"hi"}"#).unwrap();
        assert_eq!(send, ClientEvent::SendMessageToPartner { payload: "hi".into() });
    }

    #[test]
    fn rejects_unknown_event() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"Shutdown"}"#).is_err());
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"JoinRoom"}"#).is_err());
    }

    #[test]
    fn server_event_shapes() {
        assert_eq!(
            serde_json::to_value(ServerEvent::RoomCreated { code: "123456".into() }).unwrap(),
            json!({"event": "RoomCreated", "code": "123456"})
        );
        assert_eq!(
            serde_json::to_value(ServerEvent::PartnerDisconnected).unwrap(),
            json!({"event": "PartnerDisconnected"})
        );
        assert_eq!(
            serde_json::to_value(ServerEvent::from(&JoinError::RoomFull("123456".into())))
                .unwrap(),
            json!({
                "event": "Error",
                "reason": "room_full",
                "message": "Room 123456 is already in use",
            })
        );
    }
}
