//! Versioning and approval engine error types

use thiserror::Error;

use super::snapshot::SnapshotError;

/// Errors raised by the versioning and approval engine
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// Chart definition not found by ID
    #[error("Chart definition {0} not found")]
    NotFound(i32),

    /// Ledger entry not found for a definition
    #[error("Version {version} not found for chart definition {definition_id}")]
    VersionNotFound {
        /// Owning definition identifier
        definition_id: i32,
        /// Requested version number
        version: i32,
    },

    /// Dataset catalog lookup failed
    #[error("Dataset {0} not found")]
    DatasetNotFound(i32),

    /// Dataset exists but is not accepting new chart definitions
    #[error("Dataset {0} is not active")]
    DatasetInactive(i32),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Validation error
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Version already approved; approval transitions exactly once
    #[error("Version {version} of chart definition {definition_id} is already approved")]
    AlreadyApproved {
        /// Owning definition identifier
        definition_id: i32,
        /// Version number that was already approved
        version: i32,
    },

    /// Concurrent appends collided on a version number; retryable
    #[error("Version number collision for chart definition {0}")]
    VersionConflict(i32),

    /// Comparison requested across two different definitions
    #[error("Versions belong to different chart definitions ({0} and {1})")]
    CrossDefinitionCompare(i32, i32),

    /// Stored snapshot failed to decode
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl DefinitionError {
    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DefinitionError::NotFound(_)
                | DefinitionError::VersionNotFound { .. }
                | DefinitionError::DatasetNotFound(_)
        )
    }

    /// Check if this is a client error rejected before any write (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DefinitionError::MissingField(_)
                | DefinitionError::Validation(_)
                | DefinitionError::DatasetInactive(_)
        )
    }

    /// Check if this is a conflict the caller may retry
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DefinitionError::AlreadyApproved { .. } | DefinitionError::VersionConflict(_)
        )
    }

    /// Check if this indicates a caller or data corruption bug; not retryable
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            DefinitionError::CrossDefinitionCompare(_, _) | DefinitionError::Snapshot(_)
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            DefinitionError::NotFound(_)
            | DefinitionError::VersionNotFound { .. }
            | DefinitionError::DatasetNotFound(_) => "NOT_FOUND",
            DefinitionError::MissingField(_)
            | DefinitionError::Validation(_)
            | DefinitionError::DatasetInactive(_) => "VALIDATION_FAILED",
            DefinitionError::AlreadyApproved { .. } | DefinitionError::VersionConflict(_) => {
                "CONFLICT"
            }
            DefinitionError::CrossDefinitionCompare(_, _) | DefinitionError::Snapshot(_) => {
                "INTEGRITY_ERROR"
            }
            DefinitionError::Internal(_) => "INTERNAL_ERROR",
            DefinitionError::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_not_found() {
        let err = DefinitionError::NotFound(42);
        assert_eq!(err.to_string(), "Chart definition 42 not found");
        assert!(err.is_not_found());
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_version_not_found() {
        let err = DefinitionError::VersionNotFound {
            definition_id: 7,
            version: 3,
        };
        assert_eq!(
            err.to_string(),
            "Version 3 not found for chart definition 7"
        );
        assert!(err.is_not_found());
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_already_approved_is_conflict() {
        let err = DefinitionError::AlreadyApproved {
            definition_id: 7,
            version: 2,
        };
        assert!(err.is_conflict());
        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn test_missing_field() {
        let err = DefinitionError::MissingField("name".to_string());
        assert_eq!(err.to_string(), "Missing required field: name");
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_cross_definition_compare_is_integrity_error() {
        let err = DefinitionError::CrossDefinitionCompare(1, 2);
        assert!(err.is_integrity_error());
        assert!(!err.is_conflict());
        assert_eq!(err.error_code(), "INTEGRITY_ERROR");
    }

    #[test]
    fn test_malformed_snapshot_wraps_as_integrity_error() {
        let err = DefinitionError::from(SnapshotError::malformed("truncated"));
        assert!(err.is_integrity_error());
        assert_eq!(err.error_code(), "INTEGRITY_ERROR");
    }
}
