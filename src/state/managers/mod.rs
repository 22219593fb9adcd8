//! Authoritative registries for sessions and battles.
//!
//! Each manager owns one domain of the lobby's shared state and is the
//! only place structural changes to it happen.

pub mod battle;
pub mod session;

pub use battle::BattleManager;
pub use session::{RegisterError, SessionManager};
