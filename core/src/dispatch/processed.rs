use std::collections::HashSet;
use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

enum Store {
    Unbounded(HashSet<String>),
    Bounded(LruCache<String, ()>),
}

/// Logical message ids that have already been accepted for sending.
///
/// Check-and-mark is a single critical section, so two requests carrying the
/// same id can never both pass.
pub struct ProcessedMessages {
    store: Mutex<Store>,
}

impl ProcessedMessages {
    /// `None` (or zero) keeps every id for the process lifetime.
    pub fn new(capacity: Option<usize>) -> Self {
        let store = match capacity.and_then(NonZeroUsize::new) {
            Some(cap) => Store::Bounded(LruCache::new(cap)),
            None => Store::Unbounded(HashSet::new()),
        };
        Self {
            store: Mutex::new(store),
        }
    }

    /// Records `id`. Returns `false` if it was already recorded.
    pub async fn try_mark(&self, id: &str) -> bool {
        let mut store = self.store.lock().await;
        match &mut *store {
            Store::Unbounded(set) => set.insert(id.to_string()),
            Store::Bounded(cache) => {
                if cache.get(id).is_some() {
                    return false;
                }
                cache.put(id.to_string(), ());
                true
            }
        }
    }

    pub async fn contains(&self, id: &str) -> bool {
        match &*self.store.lock().await {
            Store::Unbounded(set) => set.contains(id),
            Store::Bounded(cache) => cache.contains(id),
        }
    }

    pub async fn len(&self) -> usize {
        match &*self.store.lock().await {
            Store::Unbounded(set) => set.len(),
            Store::Bounded(cache) => cache.len(),
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ProcessedMessages {
    fn default() -> Self {
        Self::new(None)
    }
}
