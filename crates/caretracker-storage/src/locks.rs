use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per key. Holders of different keys never wait on each
/// other; holders of the same key run one at a time.
pub struct KeyedLocks<K> {
    inner: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().await;
            // Entries nobody holds or waits for.
            map.retain(|_, m| Arc::strong_count(m) > 1);
            map.entry(key.clone()).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Number of keys currently held or waited for.
    pub async fn active(&self) -> usize {
        let map = self.inner.lock().await;
        map.values().filter(|m| Arc::strong_count(m) > 1).count()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
