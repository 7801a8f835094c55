use dashmap::DashMap;

use crate::session::Session;

/// Concurrent registry for processes hosting several conversations.
///
/// Each entry is owned exclusively while accessed (`DashMap` shard
/// locking gives single-writer-at-a-time per session), so the sessions
/// themselves stay single-threaded as designed.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a session under an id, replacing any previous holder.
    pub fn insert(&self, id: impl Into<String>, session: Session) {
        self.sessions.insert(id.into(), session);
    }

    /// Run `f` with exclusive access to the named session.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Remove and return a session.
    pub fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }
}
