//! # Error Types: Validation Hierarchy
//!
//! Validation failures raised while constructing domain primitives. Every
//! variant names the offending field so that API responses can point the
//! caller at the exact input to fix.

use thiserror::Error;

/// A domain primitive rejected its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty after trimming.
    #[error("{field} is required and must not be blank")]
    Blank {
        /// Field that was blank.
        field: &'static str,
    },

    /// A text field exceeded its length bound.
    #[error("{field} cannot exceed {max} characters (got {actual})")]
    TooLong {
        /// Field that was too long.
        field: &'static str,
        /// Maximum number of characters allowed.
        max: usize,
        /// Number of characters supplied.
        actual: usize,
    },

    /// An identifier was not a valid reference.
    #[error("invalid {kind} ID format: \"{value}\"")]
    InvalidId {
        /// Identifier namespace ("user", "swap request").
        kind: &'static str,
        /// The string that failed to parse.
        value: String,
    },

    /// A value was outside the enumerated set for its field.
    #[error("invalid {field}: \"{value}\" (expected one of: {expected})")]
    UnknownVariant {
        /// Field being parsed.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Comma-separated list of accepted values.
        expected: &'static str,
    },

    /// Timestamp could not be represented.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_the_field() {
        let err = ValidationError::Blank {
            field: "skillRequested",
        };
        assert_eq!(
            err.to_string(),
            "skillRequested is required and must not be blank"
        );
    }

    #[test]
    fn too_long_reports_bound_and_actual() {
        let err = ValidationError::TooLong {
            field: "message",
            max: 500,
            actual: 501,
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("501"));
    }

    #[test]
    fn unknown_variant_lists_expected_values() {
        let err = ValidationError::UnknownVariant {
            field: "priority",
            value: "urgent".to_string(),
            expected: "low, medium, high",
        };
        assert!(err.to_string().contains("low, medium, high"));
    }
}
