//! Taxonomy Repository
//!
//! Sole reader/writer of the taxonomy document. The whole tree is stored
//! under one key as a bare JSON array; every save overwrites it in one call.

use std::sync::Arc;

use shared::models::TaxonomyTree;
use thiserror::Error;

use crate::store::{DocumentStore, StoreError};

/// Default store key for the taxonomy document
pub const DEFAULT_DOCUMENT_KEY: &str = "categories";

/// Repository error types
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Corrupt taxonomy document: {0}")]
    CorruptDocument(#[source] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepositoryError>;

#[derive(Clone)]
pub struct TaxonomyRepository {
    store: Arc<dyn DocumentStore>,
    key: String,
}

impl std::fmt::Debug for TaxonomyRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyRepository")
            .field("key", &self.key)
            .field("context", &self.store.context_id())
            .finish()
    }
}

impl TaxonomyRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_key(store, DEFAULT_DOCUMENT_KEY)
    }

    pub fn with_key(store: Arc<dyn DocumentStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn document_key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Read the persisted tree; a missing key is an empty tree
    pub fn load(&self) -> RepoResult<TaxonomyTree> {
        match self.store.get(&self.key)? {
            Some(raw) => Self::decode(&raw),
            None => Ok(TaxonomyTree::new()),
        }
    }

    /// Overwrite the document with the entire tree
    pub fn save(&self, tree: &TaxonomyTree) -> RepoResult<()> {
        let raw = serde_json::to_string(tree).map_err(RepositoryError::Serialization)?;
        self.store.set(&self.key, &raw)?;
        Ok(())
    }

    /// Parse a raw document (also used for values observed from other contexts)
    pub fn decode(raw: &str) -> RepoResult<TaxonomyTree> {
        serde_json::from_str(raw).map_err(RepositoryError::CorruptDocument)
    }
}
