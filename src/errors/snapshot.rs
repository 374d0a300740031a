//! Snapshot codec error types

use thiserror::Error;

/// Errors raised at the snapshot codec boundary.
///
/// Snapshots are stored as canonical JSON text; any payload that cannot be
/// parsed back into valid chart content indicates caller or data
/// corruption, not a transient condition.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Payload does not conform to the expected structured schema
    #[error("Malformed snapshot payload: {0}")]
    MalformedPayload(String),
}

impl SnapshotError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        SnapshotError::MalformedPayload(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_payload_message() {
        let err = SnapshotError::malformed("filter payload must be an object or null");
        assert_eq!(
            err.to_string(),
            "Malformed snapshot payload: filter payload must be an object or null"
        );
    }
}
