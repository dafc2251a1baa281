//! Name rules shared by every titled record.

use super::error::DomainError;

/// Longest accepted name, counted in characters.
pub const MAX_NAME_CHARS: usize = 50;

/// Check a single name: it must be non-empty and at most [`MAX_NAME_CHARS`] long.
pub fn validate_single_name(name: &str) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }

    if name.chars().count() > MAX_NAME_CHARS {
        return Err(DomainError::validation(format!(
            "name length exceed {MAX_NAME_CHARS} characters"
        )));
    }

    Ok(())
}
