//! Per-session turn locks.
//!
//! A turn is load, run, write back. Two turns interleaving on one session
//! would drop one of the writes, so handlers hold the session's lock for
//! the whole sequence. Turns on different sessions never contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::SessionId;

/// Map of session id to its turn lock. Cheap to clone; clones share locks.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    locks: Arc<Mutex<HashMap<SessionId, Arc<Mutex<()>>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the session's lock. The lock is held until the guard drops.
    pub async fn acquire(&self, session_id: SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(session_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Forgets a session's lock once no more turns can arrive for it.
    pub async fn release(&self, session_id: &SessionId) {
        self.locks.lock().await.remove(session_id);
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_acquire_waits_for_first_guard() {
        let locks = SessionLocks::new();
        let id = SessionId::new();

        let guard = locks.acquire(id).await;
        let waiting = tokio::time::timeout(Duration::from_millis(20), locks.acquire(id)).await;
        assert!(waiting.is_err());

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(200), locks.acquire(id)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn different_sessions_do_not_contend() {
        let locks = SessionLocks::new();
        let _a = locks.acquire(SessionId::new()).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire(SessionId::new())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn release_forgets_the_session() {
        let locks = SessionLocks::new();
        let id = SessionId::new();
        drop(locks.acquire(id).await);
        assert_eq!(locks.len().await, 1);

        locks.release(&id).await;
        assert_eq!(locks.len().await, 0);
    }
}
