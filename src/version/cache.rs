//! Run-scoped cache of remote tags keyed by `registry/repository`

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;
use tracing::debug;

type Slot = Arc<OnceCell<Vec<String>>>;

/// Concurrency-safe tag cache.
///
/// Every key owns a slot that is filled at most once. Concurrent first-time
/// lookups for the same key wait on the same slot, so only one of them runs
/// the fetch. A failed fetch leaves the slot empty for the next caller.
#[derive(Debug, Default)]
pub struct TagCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl TagCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map lock is only held to look up or insert a slot, never across an await
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn slot(&self, key: &str) -> Slot {
        self.lock_slots()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        self.lock_slots()
            .get(key)
            .and_then(|slot| slot.get().cloned())
    }

    /// Store tags for a key. The first value stored for a key wins.
    pub fn put(&self, key: &str, tags: Vec<String>) {
        let _ = self.slot(key).set(tags);
    }

    /// Number of keys with cached tags
    pub fn len(&self) -> usize {
        self.lock_slots()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached tags for `key`, running `fetch` to fill the slot if it is empty.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<Vec<String>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, E>>,
    {
        let slot = self.slot(key);
        if let Some(tags) = slot.get() {
            debug!("Tag cache hit for {}", key);
            return Ok(tags.clone());
        }

        slot.get_or_try_init(fetch).await.cloned()
    }
}
