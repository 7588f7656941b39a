//! Validation error types

use std::fmt;

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Numeric field outside its allowed bounds
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },

    /// Request body could not be decoded
    MalformedBody { reason: String },
}

impl ValidationError {
    /// Name of the offending field, if the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Empty { field }
            | Self::TooLong { field, .. }
            | Self::InvalidFormat { field, .. }
            | Self::OutOfRange { field, .. } => Some(field),
            Self::MalformedBody { .. } => None,
        }
    }
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
            Self::OutOfRange {
                field,
                min,
                max,
                value,
            } => write!(f, "{} must be between {} and {}, got {}", field, min, max, value),
            Self::MalformedBody { reason } => write!(f, "malformed request: {}", reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Trim and check a free-text field against a length limit.
pub(crate) fn bounded_text(
    field: &'static str,
    s: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(trimmed.to_owned())
}

/// Check an integer field against an inclusive range.
pub(crate) fn bounded_int(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}
