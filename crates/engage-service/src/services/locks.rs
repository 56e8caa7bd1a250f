//! Per-user async locks
//!
//! Voice open/close for one user is serialized through these. Entries are
//! created on demand and dropped again once nobody holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use engage_core::Snowflake;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of lazily created per-user mutexes
#[derive(Debug, Default)]
pub struct UserLocks {
    inner: DashMap<Snowflake, Arc<Mutex<()>>>,
}

/// Held lock for one user; releasing it prunes the map entry when unused
#[derive(Debug)]
pub struct UserLockGuard<'a> {
    locks: &'a UserLocks,
    user_id: Snowflake,
    guard: Option<OwnedMutexGuard<()>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock of `user_id`
    pub async fn acquire(&self, user_id: Snowflake) -> UserLockGuard<'_> {
        // Clone out of the map before awaiting so no shard lock is held across .await
        let mutex = self.inner.entry(user_id).or_default().clone();
        let guard = mutex.lock_owned().await;
        UserLockGuard {
            locks: self,
            user_id,
            guard: Some(guard),
        }
    }

    /// Number of users with a live entry
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .inner
            .remove_if(&self.user_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
