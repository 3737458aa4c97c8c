//! In-memory room registry.

pub mod code;
pub mod rooms;
pub mod session;

pub use code::CodeGenerator;
pub use rooms::{JoinError, RegistryError, RoomRegistry};
pub use session::{ConnectionId, RoomCode, Session, SessionState};
