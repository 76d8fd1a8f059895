//! Field validation shared by all record types.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum length for short display fields such as names and titles.
pub const MAX_NAME_CHARS: usize = 80;
/// Maximum length for free-text notes.
pub const MAX_NOTES_CHARS: usize = 2_000;

/// Validation failures raised before any persistence happens.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Record id is the nil UUID.
    NilId,
    /// Required text field is blank after trim.
    BlankField(&'static str),
    /// Text field exceeds its maximum length.
    TooLong { field: &'static str, max: usize },
    /// Numeric field must be strictly positive.
    NotPositive { field: &'static str, value: f64 },
    /// Numeric field must not be negative.
    Negative { field: &'static str, value: f64 },
    /// Numeric field falls outside an allowed range.
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    /// Date window is reversed.
    DateOrder {
        earlier: &'static str,
        later: &'static str,
    },
    /// Time-of-day string is not `HH:MM`.
    InvalidTimeOfDay(String),
    /// Text does not match the expected format (email, phone).
    InvalidFormat(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be nil"),
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::TooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::NotPositive { field, value } => {
                write!(f, "{field} must be greater than zero, got {value}")
            }
            Self::Negative { field, value } => {
                write!(f, "{field} must not be negative, got {value}")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} must be within {min}..={max}, got {value}"),
            Self::DateOrder { earlier, later } => {
                write!(f, "{later} must not be earlier than {earlier}")
            }
            Self::InvalidTimeOfDay(value) => {
                write!(f, "time of day must be HH:MM, got `{value}`")
            }
            Self::InvalidFormat(field) => write!(f, "{field} has an invalid format"),
        }
    }
}

impl Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub(crate) fn require_id(id: &uuid::Uuid) -> ValidationResult {
    if id.is_nil() {
        return Err(ValidationError::NilId);
    }
    Ok(())
}

pub(crate) fn require_text(field: &'static str, value: &str, max: usize) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    max_len(field, Some(value), max)
}

pub(crate) fn max_len(field: &'static str, value: Option<&str>, max: usize) -> ValidationResult {
    match value {
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        _ => Ok(()),
    }
}

pub(crate) fn positive(field: &'static str, value: Option<f64>) -> ValidationResult {
    match value {
        Some(number) if !(number > 0.0) => Err(ValidationError::NotPositive {
            field,
            value: number,
        }),
        _ => Ok(()),
    }
}

pub(crate) fn non_negative(field: &'static str, value: Option<f64>) -> ValidationResult {
    match value {
        Some(number) if !(number >= 0.0) => Err(ValidationError::Negative {
            field,
            value: number,
        }),
        _ => Ok(()),
    }
}

/// Trims optional text and maps blank values to `None`.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Trims and collapses internal whitespace runs to a single space.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
