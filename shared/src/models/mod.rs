//! Data models
//!
//! Shared between the taxonomy engine and storefront consumers.
//! All IDs are caller-supplied strings.

pub mod category;
pub mod category_ref;

// Re-exports
pub use category::*;
pub use category_ref::*;
