//! Validation error types

use std::fmt;

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required fields absent or blank
    Missing { fields: Vec<&'static str> },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., email, phone)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Request body or query string could not be decoded
    Malformed { what: &'static str, detail: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { fields } => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::Malformed { what, detail } => {
                write!(f, "invalid {}: {}", what, detail)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "fullName",
            max: 200,
        };
        assert_eq!(
            err.to_string(),
            "fullName exceeds maximum length of 200 characters"
        );
    }

    #[test]
    fn missing_lists_fields() {
        let err = ValidationError::Missing {
            fields: vec!["email", "phone"],
        };
        assert_eq!(err.to_string(), "Missing required fields: email, phone");
    }
}
