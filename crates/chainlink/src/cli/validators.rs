//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

/// Maximum item ID length accepted on the command line
pub const MAX_ITEM_ID_LENGTH: usize = 64;

/// Validate a project name.
///
/// Delegates to the domain validator in `commands::init` to maintain
/// a single source of truth for validation rules.
pub fn validate_project(s: &str) -> Result<String, String> {
    use crate::commands::init;

    let trimmed = s.trim();
    init::validate_project(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate an item ID.
///
/// Item IDs are opaque to the engine, so only shape is checked: non-empty,
/// no whitespace, no commas (they separate list arguments), at most
/// [`MAX_ITEM_ID_LENGTH`] characters.
pub fn validate_item_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Item ID cannot be empty".to_string());
    }

    if s.chars().count() > MAX_ITEM_ID_LENGTH {
        return Err(format!(
            "Item ID cannot exceed {MAX_ITEM_ID_LENGTH} characters"
        ));
    }

    if s.chars().any(|c| c.is_whitespace() || c == ',') {
        return Err(format!(
            "Invalid item ID '{s}': whitespace and commas are not allowed"
        ));
    }

    Ok(s.to_string())
}
