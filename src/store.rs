//! In-memory identity store.
//!
//! The reference [`IdentityStore`]: a mutex-guarded map from subject to
//! user record plus a monotonic id counter. The single lock is what makes
//! upsert atomic here; a database-backed implementation gets the same
//! guarantee from a unique constraint on the subject column.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::identity::{IdentityStore, InternalUser, StoreError, SubjectId, UserProfile};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<SubjectId, InternalUser>,
    next_id: u64,
}

/// A process-local identity store.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    inner: Mutex<MemoryState>,
}

impl MemoryIdentityStore {
    /// Create an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a user by subject.
    pub fn find(&self, subject: &str) -> Option<InternalUser> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.users.get(subject).cloned()
    }

    /// Number of distinct users stored.
    pub fn len(&self) -> usize {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.users.len()
    }

    /// Returns true if no user has resolved yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn upsert(&self, profile: &UserProfile) -> std::result::Result<InternalUser, StoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| StoreError("store lock poisoned".to_string()))?;
        let MemoryState { users, next_id } = &mut *guard;

        let user = users.entry(profile.subject.clone()).or_insert_with(|| {
            *next_id += 1;
            InternalUser {
                id: *next_id,
                subject: profile.subject.clone(),
                email: String::new(),
                name: String::new(),
            }
        });
        user.email = profile.email.clone();
        user.name = profile.name.clone();

        Ok(user.clone())
    }
}
