//! Shared types for the storefront taxonomy
//!
//! Category tree models, product category references, error codes and
//! small utilities used by the engine and its consumers.

pub mod error;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::ErrorCode;
pub use models::{
    Category, CategoryRef, CategoryUpdate, FullCategoryInfo, MainCategory, MainCategoryUpdate,
    SubCategory, SubCategoryUpdate, TaxonomyTree,
};
