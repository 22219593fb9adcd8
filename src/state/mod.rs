//! State management module.
//!
//! Contains the Lobby (shared server state) and the entities it owns.

mod access;
mod battle;
mod id;
mod lobby;
pub mod managers;
mod session;

pub use access::AccessLevel;
pub use battle::{Battle, BattleError, BattleRef, Bot, Departure};
pub use id::{BattleId, IdGenerator, SessionId};
pub use lobby::{Lobby, LobbyParams, ServerInfo};
pub use session::{
    CompatFlags, FLAG_NO_DEPRECATED, FLAG_PLAIN_TEXT, Outbound, Outbox, Session, SessionRef,
};
