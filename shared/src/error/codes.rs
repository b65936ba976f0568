//! Unified error codes for the storefront taxonomy
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 6xxx: Catalog / category taxonomy errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 values so consumers in other languages (the storefront
/// UI) can switch on them without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,

    // ==================== 6xxx: Catalog ====================
    /// Main category not found
    MainCategoryNotFound = 6101,
    /// Category not found
    CategoryNotFound = 6102,
    /// Sub-category not found
    SubCategoryNotFound = 6103,
    /// Id already used somewhere in the taxonomy
    CategoryDuplicateId = 6104,

    // ==================== 9xxx: System ====================
    /// Storage backend failure
    StorageError = 9002,
    /// Persisted document could not be parsed
    StorageCorrupted = 9403,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",

            ErrorCode::MainCategoryNotFound => "Main category not found",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::SubCategoryNotFound => "Sub-category not found",
            ErrorCode::CategoryDuplicateId => "Category id already exists",

            ErrorCode::StorageError => "Storage error",
            ErrorCode::StorageCorrupted => "Stored document is corrupted",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(ErrorCode::ValidationFailed),

            6101 => Ok(ErrorCode::MainCategoryNotFound),
            6102 => Ok(ErrorCode::CategoryNotFound),
            6103 => Ok(ErrorCode::SubCategoryNotFound),
            6104 => Ok(ErrorCode::CategoryDuplicateId),

            9002 => Ok(ErrorCode::StorageError),
            9403 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::MainCategoryNotFound.code(), 6101);
        assert_eq!(ErrorCode::CategoryDuplicateId.code(), 6104);
        assert_eq!(ErrorCode::StorageCorrupted.code(), 9403);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::CategoryNotFound).unwrap();
        assert_eq!(json, "6102");

        let json = serde_json::to_string(&ErrorCode::StorageError).unwrap();
        assert_eq!(json, "9002");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("6103").unwrap();
        assert_eq!(code, ErrorCode::SubCategoryNotFound);

        let result: Result<ErrorCode, _> = serde_json::from_str("6199");
        assert!(result.is_err());
    }

    #[test]
    fn test_roundtrip_all_codes() {
        let codes = [
            ErrorCode::ValidationFailed,
            ErrorCode::MainCategoryNotFound,
            ErrorCode::CategoryNotFound,
            ErrorCode::SubCategoryNotFound,
            ErrorCode::CategoryDuplicateId,
            ErrorCode::StorageError,
            ErrorCode::StorageCorrupted,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_invalid_error_code_display() {
        assert_eq!(InvalidErrorCode(42).to_string(), "invalid error code: 42");
    }
}
