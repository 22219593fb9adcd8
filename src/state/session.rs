//! Per-connection session state and its outbound queue.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::access::AccessLevel;
use super::id::{BattleId, SessionId};
use crate::security::FloodWindow;

/// Compatibility flag selecting the plain-text agreement.
pub const FLAG_PLAIN_TEXT: &str = "p";
/// Compatibility flag under which deprecated commands are refused.
pub const FLAG_NO_DEPRECATED: &str = "cl";

/// Item queued for a connection's writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A single line.
    Line(String),
    /// Lines written back to back and flushed once.
    Batch(Vec<String>),
    /// Flush what is queued, then close the connection.
    Close(String),
}

/// Sending half of a session's outbound queue.
///
/// Sends never block. A send to a connection that is already gone is
/// dropped; its cleanup runs on the connection task.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Outbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn line(&self, line: impl Into<String>) {
        let _ = self.tx.send(Outbound::Line(line.into()));
        crate::metrics::record_message_sent();
    }

    pub fn batch(&self, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        let _ = self.tx.send(Outbound::Batch(lines));
        crate::metrics::record_message_sent();
    }

    pub fn close(&self, reason: impl Into<String>) {
        let _ = self.tx.send(Outbound::Close(reason.into()));
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Flags a client declared at login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatFlags(HashSet<String>);

impl CompatFlags {
    /// Parse the LOGIN flags token: `0` for none, otherwise comma-separated.
    pub fn parse(token: &str) -> Self {
        if token == "0" {
            return Self::default();
        }
        Self(
            token
                .split(',')
                .map(str::trim)
                .filter(|flag| !flag.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn has(&self, flag: &str) -> bool {
        self.0.contains(flag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Server-side state of one connection.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    /// Set once LOGIN succeeds.
    pub username: Option<String>,
    pub access: AccessLevel,
    pub bot: bool,
    /// Battle this session is a member of.
    pub battle: Option<BattleId>,
    /// Battle this session asked to join and is waiting on.
    pub requested_battle: Option<BattleId>,
    pub compat: CompatFlags,
    pub addr: SocketAddr,
    pub user_id: Option<i64>,
    pub lobby_version: Option<String>,
    pub flood: FloodWindow,
    pub outbox: Outbox,
    /// Account that was shown the agreement and has not confirmed yet.
    pub pending_agreement: Option<String>,
    /// Set once disconnect cleanup has started. Nothing may place a
    /// departed session in a battle.
    pub departed: bool,
}

/// Shared handle to a session.
pub type SessionRef = Arc<RwLock<Session>>;

impl Session {
    pub fn new(id: SessionId, addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            username: None,
            access: AccessLevel::None,
            bot: false,
            battle: None,
            requested_battle: None,
            compat: CompatFlags::default(),
            addr,
            user_id: None,
            lobby_version: None,
            flood: FloodWindow::default(),
            outbox,
            pending_agreement: None,
            departed: false,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    /// Username for display; `*` before login.
    pub fn name(&self) -> &str {
        self.username.as_deref().unwrap_or("*")
    }

    pub fn ip(&self) -> String {
        self.addr.ip().to_string()
    }
}
