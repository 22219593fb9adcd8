//! Numeric identifiers for sessions and battles.

use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identifier of a connected session.
pub type SessionId = u64;

/// Identifier of a battle room, as shown to clients.
pub type BattleId = u64;

/// Monotonic id source. Ids are never reused within a process.
#[derive(Debug)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    /// Create a generator whose first id is `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }

    /// Generate the next unique id.
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}
