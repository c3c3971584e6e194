//! Request validation utilities for the registry API.
//!
//! License keys and HWIDs are opaque: the only requirement is that both are
//! present and non-empty. Whitespace-only values are accepted as-is.

use std::fmt;

/// Validation error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate that a string is not empty.
///
/// # Example
/// ```
/// use hwid_registry::server::validation::validate_not_empty;
///
/// assert!(validate_not_empty("LIC-1", "licenseKey").is_ok());
/// assert!(validate_not_empty("", "licenseKey").is_err());
/// ```
pub fn validate_not_empty(value: &str, field_name: &str) -> ValidationResult<()> {
    if value.is_empty() {
        Err(ValidationError::new(field_name, "cannot be empty"))
    } else {
        Ok(())
    }
}

/// Validate that an optional field is present and not empty, returning the value.
///
/// `None` (absent or `null` in JSON) and `""` are both treated as missing.
///
/// # Example
/// ```
/// use hwid_registry::server::validation::validate_required;
///
/// assert_eq!(validate_required(Some("abc"), "hwid").unwrap(), "abc");
/// assert!(validate_required(None, "hwid").is_err());
/// assert!(validate_required(Some(""), "hwid").is_err());
/// ```
pub fn validate_required<'a>(value: Option<&'a str>, field_name: &str) -> ValidationResult<&'a str> {
    match value {
        Some(v) => {
            validate_not_empty(v, field_name)?;
            Ok(v)
        }
        None => Err(ValidationError::new(field_name, "is required")),
    }
}
