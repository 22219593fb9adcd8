//! Battle room handlers.
//!
//! Membership changes take the battle mutex first and the affected session
//! second. Lines are queued only after both guards are dropped.

mod bots;
mod chat;
mod info;
mod join;
mod leave;
mod open;

pub use bots::{AddBotHandler, RemoveBotHandler};
pub use chat::SayBattleHandler;
pub use info::UpdateBattleInfoHandler;
pub use join::{JoinBattleAcceptHandler, JoinBattleDenyHandler, JoinBattleHandler};
pub use leave::LeaveBattleHandler;
pub use open::OpenBattleHandler;
