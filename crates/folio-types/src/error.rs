//! Error types for record validation in folio-types.

use thiserror::Error;

/// Errors raised when a value cannot be turned into a storable record.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RecordError {
    /// The value is not a JSON object.
    #[error("Invalid record: expected a JSON object")]
    NotAnObject,
    /// The object has no `id` field.
    #[error("Invalid record: missing `id` field")]
    MissingId,
    /// The `id` field is empty or of an unsupported type.
    #[error("Invalid record: `id` must be a non-empty string or a number, got {0}")]
    InvalidId(String),
}

/// Result type alias using folio-types' RecordError type.
pub type RecordResult<T> = std::result::Result<T, RecordError>;
