//! Room members and the session record.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Transport-assigned identifier for one live connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Mint a fresh random identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-presentable code a peer types in to join a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoomCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u32> for RoomCode {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pairing progress of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Controller present, waiting for a peer.
    Created,
    /// Both members present.
    Paired,
}

/// A room pairing a controller with at most one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub code: RoomCode,
    /// Connection that created the room.
    pub controller: ConnectionId,
    /// Connection that joined the room, once one has.
    pub peer: Option<ConnectionId>,
    pub created_at: Instant,
}

impl Session {
    pub fn new(code: RoomCode, controller: ConnectionId) -> Self {
        Self {
            code,
            controller,
            peer: None,
            created_at: Instant::now(),
        }
    }

    pub const fn state(&self) -> SessionState {
        if self.peer.is_some() {
            SessionState::Paired
        } else {
            SessionState::Created
        }
    }

    pub fn is_member(&self, id: &ConnectionId) -> bool {
        self.controller == *id || self.peer.as_ref() == Some(id)
    }

    /// All current members, controller first.
    pub fn members(&self) -> Vec<ConnectionId> {
        std::iter::once(&self.controller)
            .chain(self.peer.as_ref())
            .cloned()
            .collect()
    }

    /// Members other than `id`.
    pub fn others(&self, id: &ConnectionId) -> Vec<ConnectionId> {
        std::iter::once(&self.controller)
            .chain(self.peer.as_ref())
            .filter(|member| *member != id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpaired_session_has_only_controller() {
        let session = Session::new("123456".into(), "c".into());
        assert_eq!(session.state(), SessionState::Created);
        assert_eq!(session.members(), vec![ConnectionId::from("c")]);
        assert!(session.others(&"c".into()).is_empty());
    }

    #[test]
    fn paired_session_others_excludes_sender() {
        let mut session = Session::new("123456".into(), "c".into());
        session.peer = Some("p".into());

        assert_eq!(session.state(), SessionState::Paired);
        assert_eq!(session.others(&"c".into()), vec![ConnectionId::from("p")]);
        assert_eq!(session.others(&"p".into()), vec![ConnectionId::from("c")]);
        assert!(session.is_member(&"p".into()));
        assert!(!session.is_member(&"x".into()));
    }

    #[test]
    fn random_connection_ids_differ() {
        assert_ne!(ConnectionId::random(), ConnectionId::random());
    }
}
