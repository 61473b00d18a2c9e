use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-key in-flight markers
///
/// `acquire` waits until no other holder has the same key, so operations on
/// one key run strictly one after another while different keys proceed
/// concurrently. A key is marked from the first `acquire` until the last guard
/// for it is dropped, including guards whose wait was cancelled.
#[derive(Debug)]
pub struct InFlight<K> {
    slots: Mutex<HashMap<K, Slot>>,
}

#[derive(Debug, Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    /// Holder plus queued waiters
    users: usize,
}

impl<K> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use of `key`; released when the guard drops
    ///
    /// Dropping the returned future before it completes withdraws the wait.
    pub async fn acquire(&self, key: K) -> InFlightGuard<'_, K> {
        let lock = {
            let mut slots = self.lock_slots();
            let slot = slots.entry(key.clone()).or_default();
            slot.users += 1;
            slot.lock.clone()
        };

        let mut guard = InFlightGuard {
            owner: self,
            key,
            permit: None,
        };
        guard.permit = Some(lock.lock_owned().await);
        guard
    }

    /// Whether an operation on `key` is running or queued
    pub fn is_pending(&self, key: &K) -> bool {
        self.lock_slots().contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.lock_slots().len()
    }

    fn release(&self, key: &K) {
        let mut slots = self.lock_slots();
        let idle = match slots.get_mut(key) {
            Some(slot) => {
                slot.users = slot.users.saturating_sub(1);
                slot.users == 0
            }
            None => false,
        };
        if idle {
            slots.remove(key);
        }
    }

    // The map is only touched in short non-panicking sections; a poisoned
    // lock still holds a consistent map.
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<K, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hold on one key, or a place in its queue while `acquire` is pending
#[derive(Debug)]
pub struct InFlightGuard<'a, K: Eq + Hash + Clone> {
    owner: &'a InFlight<K>,
    key: K,
    permit: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for InFlightGuard<'_, K> {
    fn drop(&mut self) {
        drop(self.permit.take());
        self.owner.release(&self.key);
    }
}
