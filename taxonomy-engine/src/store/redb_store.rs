//! redb-backed document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `documents` | document key | JSON text | Whole-document blobs |
//!
//! # Durability
//!
//! Each `set` is one write transaction. redb commits with copy-on-write and
//! an atomic pointer swap, so a reader sees either the previous document or
//! the new one, never a mix.
//!
//! Change notifications only reach handles opened from the same process
//! (via [`RedbStore::new_context`]); redb has no cross-process watch.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, TableDefinition};
use tokio::sync::broadcast;

use super::{
    ChangeFeed, ContextId, DEFAULT_FEED_CAPACITY, DocumentStore, StoreChange, StoreResult,
};

/// Table for documents: key = document key, value = serialized document
const DOCUMENTS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("documents");

#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    feed: ChangeFeed,
    context: ContextId,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("context", &self.context)
            .finish()
    }
}

impl RedbStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            feed: ChangeFeed::new(DEFAULT_FEED_CAPACITY),
            context: ContextId::next(),
        })
    }

    /// Open another context over the same database file
    pub fn new_context(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            feed: self.feed.clone(),
            context: ContextId::next(),
        }
    }
}

impl DocumentStore for RedbStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(DOCUMENTS_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;

        tracing::debug!(key = %key, bytes = value.len(), context = %self.context, "Document written");
        self.feed.notify(key, Some(value), self.context);
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(DOCUMENTS_TABLE)?;
            table.remove(key)?.is_some()
        };
        write_txn.commit()?;

        if removed {
            self.feed.notify(key, None, self.context);
        }
        Ok(())
    }

    fn context_id(&self) -> ContextId {
        self.context
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}
