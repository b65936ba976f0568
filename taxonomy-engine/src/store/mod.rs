//! Persistent document store
//!
//! Synchronous key → string storage with a change feed. Every open handle
//! has its own [`ContextId`] (the equivalent of a browser tab); writes made
//! through one handle are reported to the others as external changes.
//!
//! ```text
//!  MemoryStore / RedbStore (context A) ──set()──┐
//!                                               ▼
//!                                    broadcast::Sender<StoreChange>
//!                                               │
//!  MemoryStore / RedbStore (context B) ◄─changes()─┘  (origin != B → external)
//! ```

pub mod memory;
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;

/// Default capacity of the change feed channel
pub const DEFAULT_FEED_CAPACITY: usize = 64;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one execution context sharing a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocate a process-unique context id
    pub fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// A key was written (or deleted when `value` is `None`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
    pub value: Option<String>,
    pub origin: ContextId,
}

impl StoreChange {
    /// True when the write came from a context other than `observer`
    pub fn is_external_to(&self, observer: ContextId) -> bool {
        self.origin != observer
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] ::redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] ::redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] ::redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] ::redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] ::redb::CommitError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value document store shared by every context of the application
pub trait DocumentStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Overwrite `key` in a single operation
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Context this handle writes as
    fn context_id(&self) -> ContextId;

    /// Subscribe to writes from every context (filter with [`StoreChange::is_external_to`])
    fn changes(&self) -> broadcast::Receiver<StoreChange>;
}

/// Fan-out of store writes, shared by all handles of one store
#[derive(Debug, Clone)]
pub(crate) struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl ChangeFeed {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub(crate) fn notify(&self, key: &str, value: Option<&str>, origin: ContextId) {
        // No receivers is fine: nobody else is watching yet
        let _ = self.tx.send(StoreChange {
            key: key.to_string(),
            value: value.map(str::to_string),
            origin,
        });
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }
}
