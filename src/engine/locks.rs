//! Per-user serialization of workout processing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

/// Entries kept before idle locks are pruned.
const PRUNE_THRESHOLD: usize = 1024;

/// Hands out one mutex per user so sequential workouts of the same user
/// are detected in order while different users proceed in parallel.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock handle for `user_id`, created on first use.
    pub fn handle(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = lock(&self.locks);

        if locks.len() >= PRUNE_THRESHOLD {
            // Only the map holds an idle handle.
            locks.retain(|_, handle| Arc::strong_count(handle) > 1);
        }

        Arc::clone(locks.entry(user_id).or_default())
    }

    /// Number of tracked users.
    pub fn len(&self) -> usize {
        lock(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock a mutex, recovering the guard if a holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_user_shares_handle() {
        let locks = UserLocks::new();
        let user = Uuid::new_v4();
        let a = locks.handle(user);
        let b = locks.handle(user);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &locks.handle(Uuid::new_v4())));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_idle_handles_are_pruned() {
        let locks = UserLocks::new();
        let held_user = Uuid::new_v4();
        let held = locks.handle(held_user);
        for _ in 0..PRUNE_THRESHOLD {
            locks.handle(Uuid::new_v4());
        }
        locks.handle(Uuid::new_v4());
        assert!(locks.len() < PRUNE_THRESHOLD);
        assert!(Arc::ptr_eq(&held, &locks.handle(held_user)));
    }
}
