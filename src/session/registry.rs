//! Concurrent session table.
//!
//! `SessionRegistry` maps session ids to the [`SessionHandle`] of the actor
//! currently serving that session. Each entry is tagged with the
//! [`ConnectionId`] of its actor so that teardown only ever removes the
//! entry it inserted, even when a newer `CONNECT` has replaced it.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;

use super::SessionHandle;

/// Identifier assigned to each broker connection attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl ConnectionId {
    /// Create a new [`ConnectionId`] with the provided value.
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    /// Allocate a process-unique id.
    #[must_use]
    pub fn next() -> Self { Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// Concurrent registry of session handles keyed by session id.
#[derive(Default)]
pub struct SessionRegistry(DashMap<String, SessionHandle>);

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Handle for `session_id`, if one is registered.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.0.get(session_id).map(|entry| entry.value().clone())
    }

    /// Register `handle` under its session id, returning any handle it
    /// replaced.
    pub fn insert(&self, handle: SessionHandle) -> Option<SessionHandle> {
        self.0.insert(handle.session_id().to_owned(), handle)
    }

    /// Remove the entry for `session_id` if it still belongs to
    /// `connection_id`.
    ///
    /// Returns `true` only for the call that actually removed the entry, so
    /// concurrent teardown paths may all call this safely.
    pub fn remove(&self, session_id: &str, connection_id: ConnectionId) -> bool {
        self.0
            .remove_if(session_id, |_, handle| handle.connection_id() == connection_id)
            .is_some()
    }

    /// Returns `true` if a handle is registered for `session_id`.
    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool { self.0.contains_key(session_id) }

    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Ids of every registered session.
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        self.0.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Remove every entry, returning the handles.
    ///
    /// `DashMap` offers no atomic drain, so entries inserted concurrently may
    /// survive; callers use this only once inserts have stopped.
    pub fn drain(&self) -> Vec<SessionHandle> {
        let ids = self.session_ids();
        ids.iter()
            .filter_map(|id| self.0.remove(id).map(|(_, handle)| handle))
            .collect()
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish()
    }
}
