//! Registry of open battles.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::state::battle::{Battle, BattleRef};
use crate::state::id::{BattleId, IdGenerator, SessionId};

/// Authoritative collection of open battles.
#[derive(Debug, Default)]
pub struct BattleManager {
    ids: IdGenerator,
    battles: DashMap<BattleId, BattleRef>,
}

impl BattleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a battle founded by `founder` and register it.
    pub fn open(
        &self,
        founder: SessionId,
        founder_name: &str,
        max_players: u32,
        map_hash: i32,
        map_name: String,
    ) -> BattleRef {
        let id = self.ids.next();
        let battle = Arc::new(Mutex::new(Battle::new(
            id,
            founder,
            founder_name.to_string(),
            max_players,
            map_hash,
            map_name,
        )));
        self.battles.insert(id, Arc::clone(&battle));
        crate::metrics::set_active_battles(self.battles.len());
        battle
    }

    pub fn get(&self, id: BattleId) -> Option<BattleRef> {
        self.battles.get(&id).map(|b| b.value().clone())
    }

    pub fn remove(&self, id: BattleId) -> Option<BattleRef> {
        let removed = self.battles.remove(&id).map(|(_, battle)| battle);
        crate::metrics::set_active_battles(self.battles.len());
        removed
    }

    /// Point-in-time copy, ordered by battle id.
    pub fn snapshot(&self) -> Vec<BattleRef> {
        let mut all: Vec<_> = self
            .battles
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        all.sort_by_key(|(id, _)| *id);
        all.into_iter().map(|(_, battle)| battle).collect()
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }
}
