//! Thread-safe registry of live rooms.
//!
//! Rooms are keyed by code, and a reverse index maps each member connection
//! back to its room. Both maps live behind one lock and are only mutated
//! together, so readers never see a room without its index entries or the
//! other way round.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::code::CodeGenerator;
use super::session::{ConnectionId, RoomCode, Session, SessionState};

/// Failure to allocate a room.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No free room code after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("Connection {connection} is already in a room")]
    AlreadyMember { connection: ConnectionId },
}

/// Reason a join was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("Room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("Room {0} is already in use")]
    RoomFull(RoomCode),

    #[error("Connection {connection} is already in a room")]
    AlreadyMember { connection: ConnectionId },
}

#[derive(Default)]
struct RoomTable {
    rooms: HashMap<RoomCode, Session>,
    members: HashMap<ConnectionId, RoomCode>,
}

impl RoomTable {
    fn detach(&mut self, code: &RoomCode) -> Option<Session> {
        let session = self.rooms.remove(code)?;
        for member in session.members() {
            self.members.remove(&member);
        }
        Some(session)
    }
}

/// Registry of rooms shared by every connection task.
pub struct RoomRegistry {
    table: RwLock<RoomTable>,
    codes: CodeGenerator,
}

impl RoomRegistry {
    pub fn new(codes: CodeGenerator) -> Self {
        Self {
            table: RwLock::new(RoomTable::default()),
            codes,
        }
    }

    /// Open a room controlled by `controller` and return its code.
    pub async fn create(&self, controller: ConnectionId) -> Result<RoomCode, RegistryError> {
        let mut table = self.table.write().await;
        if table.members.contains_key(&controller) {
            return Err(RegistryError::AlreadyMember {
                connection: controller,
            });
        }

        let attempts = self.codes.max_attempts();
        for _ in 0..attempts {
            let code = self.codes.candidate();
            if table.rooms.contains_key(&code) {
                debug!(code = %code, "Room code collision, retrying");
                continue;
            }
            table.members.insert(controller.clone(), code.clone());
            table
                .rooms
                .insert(code.clone(), Session::new(code.clone(), controller.clone()));
            info!(code = %code, controller = %controller, "Room created");
            return Ok(code);
        }

        warn!(attempts, rooms = table.rooms.len(), "Room code space exhausted");
        Err(RegistryError::Exhausted { attempts })
    }

    /// Claim the peer slot of `code` for `peer`.
    ///
    /// Exactly one of several concurrent joins on the same room wins; the
    /// rest see `RoomFull`.
    pub async fn join(&self, code: &RoomCode, peer: ConnectionId) -> Result<Session, JoinError> {
        let mut table = self.table.write().await;
        let RoomTable { rooms, members } = &mut *table;

        let Some(session) = rooms.get_mut(code) else {
            return Err(JoinError::RoomNotFound(code.clone()));
        };
        if session.peer.is_some() {
            return Err(JoinError::RoomFull(code.clone()));
        }
        if members.contains_key(&peer) {
            return Err(JoinError::AlreadyMember { connection: peer });
        }

        members.insert(peer.clone(), code.clone());
        session.peer = Some(peer.clone());
        info!(code = %code, peer = %peer, "Peer joined room");
        Ok(session.clone())
    }

    /// Find the room `connection` belongs to.
    pub async fn resolve(&self, connection: &ConnectionId) -> Option<Session> {
        let table = self.table.read().await;
        let code = table.members.get(connection)?;
        table.rooms.get(code).cloned()
    }

    /// Look up a room by code.
    pub async fn get(&self, code: &RoomCode) -> Option<Session> {
        self.table.read().await.rooms.get(code).cloned()
    }

    /// Delete a room. Removing an unknown code is a no-op.
    pub async fn remove(&self, code: &RoomCode) -> Option<Session> {
        let removed = self.table.write().await.detach(code);
        if removed.is_some() {
            info!(code = %code, "Room removed");
        }
        removed
    }

    /// Remove and return the room `connection` belongs to, in one step.
    pub async fn leave(&self, connection: &ConnectionId) -> Option<Session> {
        let mut table = self.table.write().await;
        let code = table.members.get(connection)?.clone();
        let removed = table.detach(&code);
        if removed.is_some() {
            info!(code = %code, connection = %connection, "Room closed by member");
        }
        removed
    }

    /// Remove unpaired rooms older than `max_age`. Paired rooms are kept.
    pub async fn sweep_idle(&self, max_age: Duration) -> Vec<Session> {
        let mut table = self.table.write().await;
        let expired: Vec<RoomCode> = table
            .rooms
            .values()
            .filter(|s| s.state() == SessionState::Created && s.created_at.elapsed() >= max_age)
            .map(|s| s.code.clone())
            .collect();

        let removed: Vec<Session> = expired
            .iter()
            .filter_map(|code| table.detach(code))
            .collect();
        if !removed.is_empty() {
            info!(count = removed.len(), "Expired idle rooms");
        }
        removed
    }

    /// Number of live rooms.
    pub async fn len(&self) -> usize {
        self.table.read().await.rooms.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(CodeGenerator::default())
    }
}
