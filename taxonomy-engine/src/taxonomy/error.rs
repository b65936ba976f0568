//! Taxonomy error types

use std::fmt;

use shared::error::ErrorCode;
use thiserror::Error;

use super::repository::RepositoryError;

/// Tree level an id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    MainCategory,
    Category,
    SubCategory,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::MainCategory => write!(f, "Main category"),
            NodeKind::Category => write!(f, "Category"),
            NodeKind::SubCategory => write!(f, "Sub-category"),
        }
    }
}

/// Errors returned by mutating engine operations
///
/// A failed operation never saves and never publishes.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: NodeKind, id: String },

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl TaxonomyError {
    pub fn not_found(kind: NodeKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable code for the storefront UI
    pub fn code(&self) -> ErrorCode {
        match self {
            TaxonomyError::NotFound { kind, .. } => match kind {
                NodeKind::MainCategory => ErrorCode::MainCategoryNotFound,
                NodeKind::Category => ErrorCode::CategoryNotFound,
                NodeKind::SubCategory => ErrorCode::SubCategoryNotFound,
            },
            TaxonomyError::DuplicateId(_) => ErrorCode::CategoryDuplicateId,
            TaxonomyError::Validation(_) => ErrorCode::ValidationFailed,
            TaxonomyError::Storage(RepositoryError::CorruptDocument(_)) => {
                ErrorCode::StorageCorrupted
            }
            TaxonomyError::Storage(_) => ErrorCode::StorageError,
        }
    }
}

/// Result type for taxonomy operations
pub type TaxonomyResult<T> = Result<T, TaxonomyError>;
