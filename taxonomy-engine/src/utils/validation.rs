//! Input validation helpers
//!
//! Centralized text length constants and validation functions for node
//! fields. Lengths are counted in chars, not bytes.

use crate::taxonomy::TaxonomyError;

// ── Text length limits ──────────────────────────────────────────────

/// Node names: main category, category, sub-category
pub const MAX_NAME_LEN: usize = 200;

/// Node ids
pub const MAX_ID_LEN: usize = 128;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), TaxonomyError> {
    if value.trim().is_empty() {
        return Err(TaxonomyError::validation(format!("{field} must not be empty")));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(TaxonomyError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, passes [`validate_required_text`].
///
/// `None` means "leave unchanged" in update payloads, so only a supplied
/// value is checked.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), TaxonomyError> {
    if let Some(v) = value {
        validate_required_text(v, field, max_len)?;
    }
    Ok(())
}
