//! Typed errors for the normalization and aggregation pipeline.
//!
//! I/O and input-format failures stay on `anyhow`; the errors here are the
//! ones callers are expected to match on.

use thiserror::Error;

/// Why a single raw record could not become a [`RepositoryRecord`].
///
/// [`RepositoryRecord`]: crate::record::RepositoryRecord
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("required field '{field}' is missing")]
    MissingField { field: &'static str },

    #[error("field '{field}' is not a non-negative integer: '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("field '{field}' is not an ISO-8601 timestamp: '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("repository name '{value}' is not in owner/repo form")]
    InvalidName { value: String },

    #[error("updated_at {updated_at} is earlier than created_at {created_at}")]
    UpdatedBeforeCreated {
        created_at: String,
        updated_at: String,
    },
}

impl NormalizeError {
    /// The input field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            NormalizeError::MissingField { field }
            | NormalizeError::InvalidField { field, .. }
            | NormalizeError::InvalidTimestamp { field, .. } => field,
            NormalizeError::InvalidName { .. } => "name",
            NormalizeError::UpdatedBeforeCreated { .. } => "updated_at",
        }
    }

    /// True when a required field is absent or could not be parsed as its
    /// declared type. Timestamp failures are included.
    pub fn is_missing_field(&self) -> bool {
        !matches!(self, NormalizeError::UpdatedBeforeCreated { .. })
    }

    /// True for failures specific to timestamp fields.
    pub fn is_timestamp(&self) -> bool {
        matches!(
            self,
            NormalizeError::InvalidTimestamp { .. } | NormalizeError::UpdatedBeforeCreated { .. }
        )
    }
}

/// A batch was rejected because one of its records failed to normalize.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record #{position} ({name}) rejected: {source}")]
pub struct CollectionError {
    pub position: usize,
    pub name: String,
    #[source]
    pub source: NormalizeError,
}

/// Aggregation needs at least one repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("cannot aggregate an empty repository collection")]
    EmptyInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_errors_are_missing_field_class() {
        let err = NormalizeError::InvalidTimestamp {
            field: "created_at",
            value: "yesterday".to_string(),
        };
        assert!(err.is_missing_field());
        assert!(err.is_timestamp());
        assert_eq!(err.field(), "created_at");
    }

    #[test]
    fn test_order_violation_is_not_missing_field() {
        let err = NormalizeError::UpdatedBeforeCreated {
            created_at: "2020-01-02T00:00:00Z".to_string(),
            updated_at: "2020-01-01T00:00:00Z".to_string(),
        };
        assert!(!err.is_missing_field());
        assert!(err.is_timestamp());
    }

    #[test]
    fn test_collection_error_message_names_record() {
        let err = CollectionError {
            position: 3,
            name: "rust-lang/rust".to_string(),
            source: NormalizeError::MissingField { field: "stars" },
        };
        assert_eq!(
            err.to_string(),
            "record #3 (rust-lang/rust) rejected: required field 'stars' is missing"
        );
    }
}
