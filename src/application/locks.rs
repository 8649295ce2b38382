//! Keyed mutual exclusion.
//!
//! One async mutex per key, created on first use. Conversations are locked
//! by id so every read-modify-write of a conversation document runs alone;
//! interviewer queues are locked by interviewer number.
//!
//! Lock order: an interviewer queue lock may be held while taking a
//! conversation lock, never the other way round.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::{ConversationId, ParticipantId};

/// Lazily created async mutex per key.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`. Released when the guard drops.
    pub async fn acquire(&self, key: &K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drops the entry for `key` if nobody holds or waits on it.
    pub fn forget(&self, key: &K) {
        let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if map.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-conversation serialization.
pub type ConversationLocks = KeyedLocks<ConversationId>;

/// Per-interviewer queue serialization.
pub type QueueLocks = KeyedLocks<ParticipantId>;
