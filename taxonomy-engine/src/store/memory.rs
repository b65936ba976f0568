//! In-process document store
//!
//! Backed by a shared `HashMap`. Cloning a handle keeps the same context;
//! [`MemoryStore::new_context`] opens another context over the same data.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::{ChangeFeed, ContextId, DEFAULT_FEED_CAPACITY, DocumentStore, StoreChange, StoreResult};

struct Shared {
    data: RwLock<HashMap<String, String>>,
    feed: ChangeFeed,
}

#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    context: ContextId,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("context", &self.context)
            .field("keys", &self.shared.data.read().len())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FEED_CAPACITY)
    }

    /// Create a store whose change feed buffers `capacity` writes per receiver
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                data: RwLock::new(HashMap::new()),
                feed: ChangeFeed::new(capacity),
            }),
            context: ContextId::next(),
        }
    }

    /// Open another context over the same data
    pub fn new_context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            context: ContextId::next(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.shared.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.shared
            .data
            .write()
            .insert(key.to_string(), value.to_string());
        self.shared.feed.notify(key, Some(value), self.context);
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let removed = self.shared.data.write().remove(key);
        if removed.is_some() {
            self.shared.feed.notify(key, None, self.context);
        }
        Ok(())
    }

    fn context_id(&self) -> ContextId {
        self.context
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.shared.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));

        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_contexts_share_data() {
        let tab_a = MemoryStore::new();
        let tab_b = tab_a.new_context();
        assert_ne!(tab_a.context_id(), tab_b.context_id());

        tab_a.set("k", "from-a").unwrap();
        assert_eq!(tab_b.get("k").unwrap().as_deref(), Some("from-a"));
    }

    #[test]
    fn test_write_is_external_only_to_other_contexts() {
        let tab_a = MemoryStore::new();
        let tab_b = tab_a.new_context();
        let mut rx = tab_b.changes();

        tab_a.set("k", "v").unwrap();
        let change = rx.try_recv().unwrap();
        assert!(change.is_external_to(tab_b.context_id()));
        assert!(!change.is_external_to(tab_a.context_id()));
    }

    #[test]
    fn test_delete_missing_key_does_not_notify() {
        let store = MemoryStore::new();
        let mut rx = store.changes();
        store.delete("missing").unwrap();
        assert!(rx.try_recv().is_err());
    }
}
