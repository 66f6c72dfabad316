//! Input validation primitives.
//!
//! Ergonomic helpers that replace verbose ok_or_else +
//! Error::validation_invalid_argument chains.

use crate::error::{Error, Result};

/// Require a string to be non-empty after trimming.
///
/// Returns a reference to the trimmed string on success.
pub fn require_non_empty<'a>(value: &'a str, field: &str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation_invalid_argument(field, message, None, None))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_non_empty_trims_whitespace() {
        let result = require_non_empty("  main  ", "branch", "msg");
        assert_eq!(result.unwrap(), "main");
    }

    #[test]
    fn require_non_empty_fails_for_empty() {
        let result = require_non_empty("", "branch", "Cannot be empty");
        assert!(result.is_err());
    }

    #[test]
    fn require_non_empty_fails_for_whitespace_only() {
        let result = require_non_empty("   ", "branch", "Cannot be empty");
        assert!(result.is_err());
    }
}
