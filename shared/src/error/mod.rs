//! Unified error codes for the storefront taxonomy
//!
//! - [`ErrorCode`]: stable numeric codes surfaced to the storefront UI
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 6xxx: Catalog / category taxonomy errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::ErrorCode;
//!
//! let code = ErrorCode::CategoryNotFound;
//! assert_eq!(code.code(), 6102);
//! assert_eq!(code.message(), "Category not found");
//! ```

mod codes;

pub use codes::{ErrorCode, InvalidErrorCode};
