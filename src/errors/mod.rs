//! Domain-specific error types for chartledger.
//!
//! Two error domains cover the engine:
//!
//! - **SnapshotError**: snapshot payload encoding/decoding and schema
//!   validation at the codec boundary
//! - **DefinitionError**: everything the versioning and approval engine can
//!   reject — validation, lookups, approval conflicts, integrity violations
//!
//! Handlers translate `DefinitionError` into HTTP status codes via its
//! `error_code()`/`is_*` helpers; the engine itself never maps to transport
//! concerns.

pub mod definition;
pub mod snapshot;

pub use definition::DefinitionError;
pub use snapshot::SnapshotError;

/// Result type alias for versioning and approval operations
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// Result type alias for snapshot codec operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;
