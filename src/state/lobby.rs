//! The Lobby - central shared state.
//!
//! Everything a handler may touch hangs off one `Arc<Lobby>` built in
//! `main`: the registries, flood parameters and the collaborators.
//!
//! # Lock order
//!
//! Battle mutex, then session lock. Arcs are cloned out of the registries
//! before locking, and no guard is held while lines are queued.

use std::sync::Arc;

use tracing::{debug, info};

use super::battle::Departure;
use super::id::SessionId;
use super::managers::{BattleManager, SessionManager};
use super::session::SessionRef;
use crate::config::FloodAction;
use crate::db::BanService;
use crate::security::FloodProtection;
use crate::services::{AccountStore, Agreement, UpdateCatalog};

/// Identity announced to clients.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub protocol_version: String,
}

/// Parameters for constructing the Lobby.
pub struct LobbyParams {
    pub server: ServerInfo,
    pub flood: FloodProtection,
    pub flood_action: FloodAction,
    pub bans: Arc<dyn BanService>,
    pub accounts: AccountStore,
    pub agreement: Agreement,
    pub updates: UpdateCatalog,
}

/// Shared lobby state.
pub struct Lobby {
    pub server: ServerInfo,
    pub sessions: SessionManager,
    pub battles: BattleManager,
    pub flood: FloodProtection,
    pub flood_action: FloodAction,
    pub bans: Arc<dyn BanService>,
    pub accounts: AccountStore,
    pub agreement: Agreement,
    pub updates: UpdateCatalog,
}

impl Lobby {
    pub fn new(params: LobbyParams) -> Self {
        Self {
            server: params.server,
            sessions: SessionManager::new(),
            battles: BattleManager::new(),
            flood: params.flood,
            flood_action: params.flood_action,
            bans: params.bans,
            accounts: params.accounts,
            agreement: params.agreement,
            updates: params.updates,
        }
    }

    /// Queue a line for one registered session.
    pub fn send_to(&self, sid: SessionId, line: impl Into<String>) {
        if let Some(outbox) = self.sessions.outbox(sid) {
            outbox.line(line);
        }
    }

    /// Queue a line for each listed session that is still registered.
    pub fn send_to_many(&self, sids: &[SessionId], line: &str) {
        for sid in sids {
            self.send_to(*sid, line);
        }
    }

    /// Queue a line for every registered session.
    pub fn broadcast(&self, line: &str) {
        for outbox in self.sessions.outboxes(None) {
            outbox.line(line);
        }
    }

    /// Queue a line for every registered session but one.
    pub fn broadcast_except(&self, except: SessionId, line: &str) {
        for outbox in self.sessions.outboxes(Some(except)) {
            outbox.line(line);
        }
    }

    /// Take `session` out of its battle, cascading bot removal or, for a
    /// founder, closing the battle. Returns `false` if it was in none.
    pub fn leave_battle(&self, sid: SessionId, session: &SessionRef) -> bool {
        let (battle_id, username) = {
            let s = session.read();
            match s.battle {
                Some(id) => (id, s.name().to_string()),
                None => return false,
            }
        };

        let Some(battle) = self.battles.get(battle_id) else {
            session.write().battle = None;
            return false;
        };

        let departure = {
            let mut b = battle.lock();
            let departure = b.remove_member(sid);
            if let Ok(Departure::Closed { evicted }) = &departure {
                for member in evicted.iter().filter(|m| **m != sid) {
                    if let Some(other) = self.sessions.get(*member) {
                        let mut other = other.write();
                        if other.battle == Some(battle_id) {
                            other.battle = None;
                        }
                    }
                }
            }
            session.write().battle = None;
            departure
        };

        match departure {
            Ok(Departure::Left {
                removed_bots,
                remaining,
            }) => {
                for bot in removed_bots {
                    self.send_to_many(&remaining, &format!("REMOVEBOT {battle_id} {bot}"));
                }
                self.broadcast(&format!("LEFTBATTLE {battle_id} {username}"));
                debug!(battle = battle_id, user = %username, "Left battle");
            }
            Ok(Departure::Closed { evicted }) => {
                self.battles.remove(battle_id);
                self.broadcast(&format!("BATTLECLOSED {battle_id}"));
                info!(battle = battle_id, founder = %username, evicted = evicted.len(), "Battle closed");
            }
            Err(e) => {
                // Closed concurrently, or membership already gone
                debug!(battle = battle_id, user = %username, error = %e, "Stale battle reference");
                return false;
            }
        }
        true
    }

    /// Disconnect cleanup. Runs the cascade only for the caller that
    /// actually removed the session; later calls return `false`.
    pub fn disconnect(&self, sid: SessionId, reason: &str) -> bool {
        let Some(session) = self.sessions.remove(sid) else {
            return false;
        };
        crate::metrics::set_connected_sessions(self.sessions.len());

        session.write().departed = true;
        self.leave_battle(sid, &session);
        let username = session.read().name().to_string();
        self.broadcast(&format!("REMOVEUSER {username}"));
        info!(session = sid, user = %username, reason = %reason, "Session removed");
        true
    }

    /// Kick a logged-in user. Returns `false` if nobody by that name is online.
    pub fn kick(&self, username: &str, by: &str, reason: Option<&str>) -> bool {
        let Some((sid, session)) = self.sessions.by_username(username) else {
            return false;
        };
        let outbox = session.read().outbox.clone();

        let notice = match reason {
            Some(reason) => format!(
                "SERVERMSG You have been kicked from the server by {by} ({reason})"
            ),
            None => format!("SERVERMSG You have been kicked from the server by {by}"),
        };
        outbox.line(notice);
        outbox.close(format!("Kicked by {by}"));
        self.disconnect(sid, &format!("kicked by {by}"));
        true
    }

    /// State burst for a session that just logged in, ending with `LOGININFOEND`.
    pub fn login_snapshot(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .sessions
            .snapshot()
            .into_iter()
            .filter_map(|(_, session)| {
                session
                    .read()
                    .username
                    .as_ref()
                    .map(|name| format!("ADDUSER {name}"))
            })
            .collect();

        for battle in self.battles.snapshot() {
            let b = battle.lock();
            if b.is_closed() {
                continue;
            }
            lines.push(b.opened_line());
            lines.extend(
                b.joined_names()
                    .map(|name| format!("JOINEDBATTLE {} {}", b.id, name)),
            );
        }

        lines.push("LOGININFOEND".to_string());
        lines
    }
}
