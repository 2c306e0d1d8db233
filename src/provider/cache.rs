// src/provider/cache.rs

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::tree::Node;

type Slot = Arc<OnceCell<Arc<Node>>>;

/// Per-pipeline cache of raw trees with single-flight builds.
///
/// Each key maps to a slot that is filled at most once. Concurrent callers
/// for the same key share one build: the first one runs it, the rest await
/// the same slot. Invalidation swaps the slot out, so a build already in
/// flight still completes for its waiters but is never served afterwards.
#[derive(Debug, Default)]
pub struct TreeCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl TreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The finished tree for `key`, if one is cached.
    pub fn get(&self, key: &str) -> Option<Arc<Node>> {
        self.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Return the cached tree for `key`, building it with `build` on a miss.
    pub async fn get_or_build<F, Fut>(&self, key: &str, build: F) -> Arc<Node>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Node>,
    {
        let slot = Arc::clone(self.lock().entry(key.to_string()).or_default());
        slot.get_or_init(|| async move {
            debug!(pipeline = %key, "cache miss; building tree");
            Arc::new(build().await)
        })
        .await
        .clone()
    }

    /// Drop the tree for `key`. Returns true if there was one (or one in flight).
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn invalidate_all(&self) {
        self.lock().clear();
    }

    /// Number of finished trees.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
