//! In-memory session store, partitioned by user.
//!
//! Each user id owns a slot guarded by its own async mutex. A turn holds the
//! slot lock from routing until the session is written back, so two turns for
//! the same user never interleave, while turns for different users only share
//! the brief map lookup.
//!
//! Slots outlive the sessions they hold: removing a session empties the slot
//! instead of dropping it, so a turn queued behind a reset still serializes on
//! the same lock. Empty, unused slots are reclaimed by [`SessionStore::sweep_idle`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::aggregate::Session;
use crate::value_objects::UserId;

type Slot = Arc<Mutex<Option<Session>>>;

/// Exclusive access to one user's slot for the duration of a turn
pub struct SessionLease {
    user_id: UserId,
    guard: OwnedMutexGuard<Option<Session>>,
}

impl SessionLease {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn session(&self) -> Option<&Session> {
        self.guard.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.guard.as_mut()
    }

    /// Store a session in the slot, replacing any existing one
    pub fn insert(&mut self, session: Session) {
        *self.guard = Some(session);
    }

    /// Take the session out, leaving the slot empty
    pub fn remove(&mut self) -> Option<Session> {
        self.guard.take()
    }
}

/// Key-partitioned session store
pub struct SessionStore {
    slots: RwLock<HashMap<UserId, Slot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, user_id: &UserId) -> Slot {
        // Fast path: slot already exists.
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(user_id) {
                return Arc::clone(slot);
            }
        }

        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(user_id.clone()).or_default())
    }

    /// Lock a user's slot, waiting for any turn already in progress
    pub async fn lease(&self, user_id: &UserId) -> SessionLease {
        let slot = self.slot(user_id).await;
        SessionLease {
            user_id: user_id.clone(),
            guard: slot.lock_owned().await,
        }
    }

    /// Snapshot of a user's session
    pub async fn get(&self, user_id: &UserId) -> Option<Session> {
        let slot = {
            let slots = self.slots.read().await;
            slots.get(user_id).map(Arc::clone)?
        };
        let guard = slot.lock().await;
        guard.clone()
    }

    /// Return the user's session, creating a fresh one if none exists
    pub async fn create_if_absent(&self, user_id: &UserId) -> Session {
        let mut lease = self.lease(user_id).await;
        if let Some(session) = lease.session() {
            return session.clone();
        }

        let (session, _) = Session::start(user_id.clone());
        tracing::info!(user_id = %user_id, session_id = %session.id(), "session created");
        lease.insert(session.clone());
        session
    }

    /// Remove a user's session; the next message starts over
    pub async fn delete(&self, user_id: &UserId) -> Option<Session> {
        let mut lease = self.lease(user_id).await;
        lease.remove()
    }

    /// Mutate a user's session in place, if it exists
    pub async fn update<F, R>(&self, user_id: &UserId, mutator: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut lease = self.lease(user_id).await;
        lease.session_mut().map(mutator)
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.read().await.values().cloned().collect();
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle for longer than `ttl` and reclaim empty slots.
    ///
    /// Slots that are locked or awaited by a turn are left alone.
    /// Returns the expired sessions.
    pub async fn sweep_idle(&self, ttl: Option<Duration>) -> Vec<Session> {
        let now = Utc::now();
        let mut expired = Vec::new();
        let mut slots = self.slots.write().await;

        slots.retain(|user_id, slot| {
            let Ok(mut guard) = Arc::clone(slot).try_lock_owned() else {
                return true;
            };
            // One reference from the map, one held by the guard.
            if Arc::strong_count(slot) > 2 {
                return true;
            }

            let stale = match (guard.as_ref(), ttl) {
                (Some(session), Some(ttl)) => session.is_expired(ttl, now),
                _ => false,
            };
            if stale {
                if let Some(session) = guard.take() {
                    tracing::info!(user_id = %user_id, session_id = %session.id(), "session expired");
                    expired.push(session);
                }
            }

            guard.is_some()
        });

        expired
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
