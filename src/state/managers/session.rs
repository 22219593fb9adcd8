//! Registry of logged-in sessions.
//!
//! A session enters the registry when LOGIN succeeds and leaves it exactly
//! once: [`SessionManager::remove`] returns `Some` only to the first caller,
//! and that caller owns the disconnect cascade.
//!
//! # Thread Safety
//!
//! All maps are DashMaps. Callers clone the `Arc` out of a map before
//! locking the session; no shard guard is held across a session lock.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::state::id::{IdGenerator, SessionId};
use crate::state::session::{Outbox, SessionRef};

/// Why a session could not be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Another live session owns the username.
    NameInUse,
}

/// Authoritative collection of logged-in sessions.
#[derive(Debug, Default)]
pub struct SessionManager {
    ids: IdGenerator,
    sessions: DashMap<SessionId, SessionRef>,
    /// Lowercased username → session id.
    usernames: DashMap<String, SessionId>,
    /// Outboxes keyed by session id, so broadcasts need no session lock.
    senders: DashMap<SessionId, Outbox>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a new connection.
    pub fn next_id(&self) -> SessionId {
        self.ids.next()
    }

    /// Enter a session under `username`. Atomic with respect to other
    /// registrations of the same name.
    pub fn register(
        &self,
        sid: SessionId,
        username: &str,
        session: SessionRef,
        outbox: Outbox,
    ) -> Result<(), RegisterError> {
        match self.usernames.entry(username.to_lowercase()) {
            Entry::Occupied(_) => return Err(RegisterError::NameInUse),
            Entry::Vacant(slot) => {
                slot.insert(sid);
            }
        }
        self.senders.insert(sid, outbox);
        self.sessions.insert(sid, session);
        Ok(())
    }

    pub fn get(&self, sid: SessionId) -> Option<SessionRef> {
        self.sessions.get(&sid).map(|s| s.value().clone())
    }

    pub fn by_username(&self, username: &str) -> Option<(SessionId, SessionRef)> {
        let sid = *self.usernames.get(&username.to_lowercase())?.value();
        self.get(sid).map(|session| (sid, session))
    }

    pub fn contains_username(&self, username: &str) -> bool {
        self.usernames.contains_key(&username.to_lowercase())
    }

    pub fn outbox(&self, sid: SessionId) -> Option<Outbox> {
        self.senders.get(&sid).map(|o| o.value().clone())
    }

    /// All outboxes, optionally skipping one session.
    pub fn outboxes(&self, except: Option<SessionId>) -> Vec<Outbox> {
        self.senders
            .iter()
            .filter(|entry| Some(*entry.key()) != except)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Remove a session. `Some` for exactly one caller per registration.
    pub fn remove(&self, sid: SessionId) -> Option<SessionRef> {
        let (_, session) = self.sessions.remove(&sid)?;
        self.senders.remove(&sid);
        let username = session.read().username.clone();
        if let Some(name) = username {
            self.usernames
                .remove_if(&name.to_lowercase(), |_, owner| *owner == sid);
        }
        Some(session)
    }

    /// Point-in-time copy of the registry, ordered by session id.
    pub fn snapshot(&self) -> Vec<(SessionId, SessionRef)> {
        let mut all: Vec<_> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        all.sort_by_key(|(sid, _)| *sid);
        all
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::Session;
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn session(manager: &SessionManager, name: &str) -> (SessionId, SessionRef, Outbox) {
        let sid = manager.next_id();
        let (outbox, _rx) = Outbox::channel();
        let mut s = Session::new(sid, "127.0.0.1:1".parse().unwrap(), outbox.clone());
        s.username = Some(name.to_string());
        (sid, Arc::new(RwLock::new(s)), outbox)
    }

    #[test]
    fn test_register_and_lookup() {
        let manager = SessionManager::new();
        let (sid, s, o) = session(&manager, "Alice");
        manager.register(sid, "Alice", s, o).unwrap();

        assert_eq!(manager.len(), 1);
        assert!(manager.contains_username("alice"));
        assert_eq!(manager.by_username("ALICE").map(|(id, _)| id), Some(sid));
        assert!(manager.outbox(sid).is_some());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let manager = SessionManager::new();
        let (a, s, o) = session(&manager, "bob");
        manager.register(a, "bob", s, o).unwrap();
        let (b, s, o) = session(&manager, "Bob");
        assert_eq!(manager.register(b, "Bob", s, o), Err(RegisterError::NameInUse));
        assert!(manager.get(b).is_none());
    }

    #[test]
    fn test_remove_exactly_once() {
        let manager = SessionManager::new();
        let (sid, s, o) = session(&manager, "carol");
        manager.register(sid, "carol", s, o).unwrap();

        assert!(manager.remove(sid).is_some());
        assert!(manager.remove(sid).is_none());
        assert!(!manager.contains_username("carol"));
        assert!(manager.outboxes(None).is_empty());
    }

    #[test]
    fn test_outboxes_except() {
        let manager = SessionManager::new();
        let (a, s, o) = session(&manager, "a");
        manager.register(a, "a", s, o).unwrap();
        let (b, s, o) = session(&manager, "b");
        manager.register(b, "b", s, o).unwrap();

        assert_eq!(manager.outboxes(None).len(), 2);
        assert_eq!(manager.outboxes(Some(a)).len(), 1);
        let ids: Vec<_> = manager.snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
    }
}
