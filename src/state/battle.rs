//! Battle rooms.
//!
//! A [`Battle`] sits behind its own mutex. Every mutation checks the
//! `closed` flag first, because a handler may resolve a battle by id just
//! before its founder leaves.

use std::collections::BTreeMap;
use std::sync::Arc;

use lobby_proto::wire_bool;
use parking_lot::Mutex;
use thiserror::Error;

use super::id::{BattleId, SessionId};

/// Shared handle to a battle.
pub type BattleRef = Arc<Mutex<Battle>>;

/// An AI player attached to a battle by one of its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bot {
    pub name: String,
    pub owner: SessionId,
    pub owner_name: String,
    pub ai: String,
}

/// Battle mutation failures. Handlers map these to protocol replies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    #[error("battle is closed")]
    Closed,
    #[error("not a member of this battle")]
    NotAMember,
    #[error("only the founder may do this")]
    NotFounder,
    #[error("already a member of this battle")]
    AlreadyMember,
    #[error("battle is full")]
    Full,
    #[error("bot name {0} is already in use")]
    BotNameTaken(String),
    #[error("no bot named {0}")]
    NoSuchBot(String),
}

/// Result of a member leaving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// An ordinary member left; their bots went with them.
    Left {
        removed_bots: Vec<String>,
        remaining: Vec<SessionId>,
    },
    /// The founder left; the battle is closed and everyone was evicted.
    Closed { evicted: Vec<SessionId> },
}

/// A game room.
#[derive(Debug)]
pub struct Battle {
    pub id: BattleId,
    pub founder: SessionId,
    pub founder_name: String,
    pub locked: bool,
    pub map_name: String,
    pub map_hash: i32,
    pub max_players: u32,
    /// Member id → username; the founder is always present while open.
    members: BTreeMap<SessionId, String>,
    bots: BTreeMap<String, Bot>,
    closed: bool,
}

impl Battle {
    pub fn new(
        id: BattleId,
        founder: SessionId,
        founder_name: String,
        max_players: u32,
        map_hash: i32,
        map_name: String,
    ) -> Self {
        let mut members = BTreeMap::new();
        members.insert(founder, founder_name.clone());
        Self {
            id,
            founder,
            founder_name,
            locked: false,
            map_name,
            map_hash,
            max_players,
            members,
            bots: BTreeMap::new(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_founder(&self, sid: SessionId) -> bool {
        !self.closed && self.founder == sid
    }

    pub fn is_member(&self, sid: SessionId) -> bool {
        self.members.contains_key(&sid)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member_ids(&self) -> Vec<SessionId> {
        self.members.keys().copied().collect()
    }

    /// Usernames of members other than the founder, ordered by session id.
    pub fn joined_names(&self) -> impl Iterator<Item = &str> {
        self.members
            .iter()
            .filter(|(sid, _)| **sid != self.founder)
            .map(|(_, name)| name.as_str())
    }

    pub fn bot(&self, name: &str) -> Option<&Bot> {
        self.bots.get(name)
    }

    pub fn bots(&self) -> impl Iterator<Item = &Bot> {
        self.bots.values()
    }

    pub fn add_member(&mut self, sid: SessionId, name: String) -> Result<(), BattleError> {
        if self.closed {
            return Err(BattleError::Closed);
        }
        if self.members.contains_key(&sid) {
            return Err(BattleError::AlreadyMember);
        }
        if self.members.len() >= self.max_players as usize {
            return Err(BattleError::Full);
        }
        self.members.insert(sid, name);
        Ok(())
    }

    /// Remove a member. The founder leaving closes the battle.
    pub fn remove_member(&mut self, sid: SessionId) -> Result<Departure, BattleError> {
        if self.closed {
            return Err(BattleError::Closed);
        }
        if !self.members.contains_key(&sid) {
            return Err(BattleError::NotAMember);
        }

        if sid == self.founder {
            let evicted = self.member_ids();
            self.close();
            return Ok(Departure::Closed { evicted });
        }

        self.members.remove(&sid);
        let removed_bots: Vec<String> = self
            .bots
            .values()
            .filter(|bot| bot.owner == sid)
            .map(|bot| bot.name.clone())
            .collect();
        for name in &removed_bots {
            self.bots.remove(name);
        }
        Ok(Departure::Left {
            removed_bots,
            remaining: self.member_ids(),
        })
    }

    pub fn add_bot(&mut self, bot: Bot) -> Result<(), BattleError> {
        if self.closed {
            return Err(BattleError::Closed);
        }
        if !self.members.contains_key(&bot.owner) {
            return Err(BattleError::NotAMember);
        }
        if self.bots.contains_key(&bot.name) {
            return Err(BattleError::BotNameTaken(bot.name));
        }
        self.bots.insert(bot.name.clone(), bot);
        Ok(())
    }

    /// Any member may remove any bot.
    pub fn remove_bot(&mut self, actor: SessionId, name: &str) -> Result<Bot, BattleError> {
        if self.closed {
            return Err(BattleError::Closed);
        }
        if !self.members.contains_key(&actor) {
            return Err(BattleError::NotAMember);
        }
        self.bots
            .remove(name)
            .ok_or_else(|| BattleError::NoSuchBot(name.to_string()))
    }

    pub fn update_info(
        &mut self,
        actor: SessionId,
        locked: bool,
        map_hash: i32,
        map_name: String,
    ) -> Result<(), BattleError> {
        if self.closed {
            return Err(BattleError::Closed);
        }
        if actor != self.founder {
            return Err(BattleError::NotFounder);
        }
        self.locked = locked;
        self.map_hash = map_hash;
        self.map_name = map_name;
        Ok(())
    }

    /// Mark closed and drop every member and bot.
    pub fn close(&mut self) {
        self.closed = true;
        self.members.clear();
        self.bots.clear();
    }

    pub fn opened_line(&self) -> String {
        format!(
            "BATTLEOPENED {} {} {} {} {}",
            self.id, self.founder_name, self.max_players, self.map_hash, self.map_name
        )
    }

    /// Rendered from stored state, never from client input.
    pub fn info_line(&self) -> String {
        format!(
            "UPDATEBATTLEINFO {} {} {} {}",
            self.id,
            wire_bool(self.locked),
            self.map_hash,
            self.map_name
        )
    }
}
