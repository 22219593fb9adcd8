//! Lobby command handlers.
//!
//! This module contains the Handler trait and command registry for dispatching
//! incoming protocol lines to the appropriate handlers.
//!
//! Handlers receive [`ParsedArgs`](lobby_proto::ParsedArgs) already checked
//! against the command's argument spec, and report every failure as a
//! [`HandlerError`]; the registry turns that into the reply.

mod bans;
mod battle;
mod connection;
pub mod core;
mod helpers;
mod oper;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::core::{Context, Handler, HandlerError, HandlerResult, Registry};
