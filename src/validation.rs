//! Field validation for incoming form payloads
//!
//! Validation happens in the route handlers, before anything reaches the
//! persistence layer. The database only ever sees well-formed values.

use std::fmt;

pub const MAX_USERNAME_LEN: usize = 20;
pub const MAX_EMAIL_LEN: usize = 120;
pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// Validation error for request fields
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., email)
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Require a non-empty value no longer than `max` characters
pub fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Require a non-empty value of any length
pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// Minimal email shape check: local part, '@', domain
pub fn valid_email(value: &str) -> Result<(), ValidationError> {
    required_text("email", value, MAX_EMAIL_LEN)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "not a valid email address",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_fields() {
        assert!(required("title", "").is_err());
        assert!(required("title", "   ").is_err());
        assert!(required("title", "Phone").is_ok());
    }

    #[test]
    fn rejects_overlong_fields() {
        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        assert!(matches!(
            required_text("username", &long, MAX_USERNAME_LEN),
            Err(ValidationError::TooLong { max: 20, .. })
        ));
        assert!(required_text("username", "alice", MAX_USERNAME_LEN).is_ok());
    }

    #[test]
    fn email_shape() {
        assert!(valid_email("alice@x.com").is_ok());
        assert!(valid_email("alice").is_err());
        assert!(valid_email("@x.com").is_err());
        assert!(valid_email("alice@nodot").is_err());
    }

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "title",
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "title exceeds maximum length of 100 characters"
        );
    }
}
