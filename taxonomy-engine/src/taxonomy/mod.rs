//! 分类模块 - three-level category taxonomy
//!
//! # 结构
//!
//! ```text
//! MainCategory ──▶ Category ──▶ SubCategory
//! ```
//!
//! - [`TaxonomyEngine`]: owns the tree, the only writer
//! - [`TaxonomyRepository`]: persists the tree as one JSON document
//! - [`validation`]: path checks and display paths, never fail
//! - [`CategorySelector`]: cascading selection for product forms
//! - [`ExternalChangeListener`]: applies writes from other contexts

pub mod audit;
pub mod engine;
pub mod error;
pub mod listener;
pub mod repository;
pub mod seed;
pub mod selector;
pub mod validation;

pub use audit::{Violation, audit};
pub use engine::{LoadOutcome, TaxonomyEngine};
pub use error::{NodeKind, TaxonomyError, TaxonomyResult};
pub use listener::ExternalChangeListener;
pub use repository::{DEFAULT_DOCUMENT_KEY, RepositoryError, TaxonomyRepository};
pub use selector::CategorySelector;
