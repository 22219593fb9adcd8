//! Command handler context and the handler trait.
//!
//! A [`Context`] is built by the connection loop for every line and gives
//! handlers the issuing session plus the shared [`Lobby`].

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use lobby_proto::ParsedArgs;

use crate::state::{Lobby, Outbox, SessionId, SessionRef};

pub use crate::error::{HandlerError, HandlerResult};

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The issuing session's id.
    pub sid: SessionId,
    /// The issuing session.
    pub session: &'a SessionRef,
    /// Shared lobby state.
    pub lobby: &'a Arc<Lobby>,
    /// Outbound queue of the issuing session.
    pub outbox: &'a Outbox,
    /// Remote address of the client.
    pub remote_addr: SocketAddr,
}

impl<'a> Context<'a> {
    pub fn new(
        sid: SessionId,
        session: &'a SessionRef,
        lobby: &'a Arc<Lobby>,
        outbox: &'a Outbox,
        remote_addr: SocketAddr,
    ) -> Self {
        Self {
            sid,
            session,
            lobby,
            outbox,
            remote_addr,
        }
    }

    /// Queue a line for the issuing session.
    #[inline]
    pub fn reply(&self, line: impl Into<String>) {
        self.outbox.line(line);
    }

    /// Username of the issuing session, `*` before login.
    pub fn username(&self) -> String {
        self.session.read().name().to_string()
    }
}

/// A command implementation.
///
/// Arity, argument types, access level and deprecation are checked by the
/// registry before `handle` runs; handlers only see well-formed arguments.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult;
}
