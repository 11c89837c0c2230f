//! Per-user session registry.
//!
//! One live session per user. Every mutating engine operation runs as a
//! single closure under the map's entry lock, so concurrent callbacks for
//! the same user serialize instead of interleaving. Nothing here awaits;
//! the lock is only ever held across synchronous work.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use quiz_core::model::UserId;

use crate::quiz::QuizSession;

/// In-process store of active quiz sessions, keyed by user.
///
/// Sessions are not persisted; a process restart loses them.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, QuizSession>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session, replacing any unfinished one for the same user.
    pub fn put(&self, session: QuizSession) {
        self.sessions.insert(session.user_id(), session);
    }

    /// Removes and returns the user's session, if any.
    pub fn remove(&self, user_id: UserId) -> Option<QuizSession> {
        self.sessions.remove(&user_id).map(|(_, session)| session)
    }

    /// Runs `f` on the user's session under the entry lock.
    ///
    /// Returns `None` when the user has no session.
    pub fn with_session<T>(
        &self,
        user_id: UserId,
        f: impl FnOnce(&mut QuizSession) -> T,
    ) -> Option<T> {
        self.sessions
            .get_mut(&user_id)
            .map(|mut entry| f(entry.value_mut()))
    }

    /// Runs `f` under the entry lock; when `f` asks for removal the session
    /// leaves the store in the same locked step and is handed back.
    ///
    /// This is the completion primitive: once an answer finishes a session,
    /// no other caller can observe or mutate it afterwards.
    pub fn with_session_removing<T>(
        &self,
        user_id: UserId,
        f: impl FnOnce(&mut QuizSession) -> (T, bool),
    ) -> Option<(T, Option<QuizSession>)> {
        match self.sessions.entry(user_id) {
            Entry::Occupied(mut occupied) => {
                let (value, remove) = f(occupied.get_mut());
                let session = remove.then(|| occupied.remove());
                Some((value, session))
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
