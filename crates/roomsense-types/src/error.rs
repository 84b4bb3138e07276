//! Error types for reading validation in roomsense-types.

use thiserror::Error;

/// Errors raised when a raw device payload fails validation.
///
/// Every variant that concerns a single field carries the field's wire name,
/// so callers can report exactly which part of the payload was rejected.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The payload was not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The payload was valid JSON but not an object.
    #[error("Reading must be a JSON object")]
    NotAnObject,

    /// A required field is absent.
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Wire name of the field.
        field: &'static str,
    },

    /// A field has the wrong JSON type.
    #[error("Field '{field}' must be {expected}, got {actual}")]
    InvalidType {
        /// Wire name of the field.
        field: &'static str,
        /// Human-readable description of the accepted type.
        expected: &'static str,
        /// The offending JSON value.
        actual: String,
    },

    /// A field has the right type but an unacceptable value.
    #[error("Field '{field}' is out of range: {value}")]
    OutOfRange {
        /// Wire name of the field.
        field: &'static str,
        /// The offending value.
        value: String,
    },

    /// Temperature and humidity come from one physical sensor and must agree.
    #[error("Field '{present}' is set but '{missing}' is null; both must be present or both null")]
    InconsistentFields {
        /// The field that carried a value.
        present: &'static str,
        /// The field that was null.
        missing: &'static str,
    },

    /// A severity level outside 0-4.
    #[error("Invalid level value: {0} (expected 0-4)")]
    InvalidLevel(u8),
}

impl ParseError {
    /// The wire name of the offending field, when the error concerns one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field }
            | Self::InvalidType { field, .. }
            | Self::OutOfRange { field, .. } => Some(field),
            Self::InconsistentFields { missing, .. } => Some(missing),
            _ => None,
        }
    }
}

/// Result type alias using roomsense-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_is_reported() {
        let err = ParseError::MissingField { field: "mq135" };
        assert_eq!(err.field(), Some("mq135"));
        assert!(err.to_string().contains("mq135"));

        let err = ParseError::InconsistentFields {
            present: "temp",
            missing: "hum",
        };
        assert_eq!(err.field(), Some("hum"));

        assert_eq!(ParseError::NotAnObject.field(), None);
    }

    #[test]
    fn test_invalid_type_display() {
        let err = ParseError::InvalidType {
            field: "temp",
            expected: "a number or null",
            actual: "\"hot\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Field 'temp' must be a number or null, got \"hot\""
        );
    }
}
